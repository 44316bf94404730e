mod go;
mod javascript;
mod python;
mod rust;

pub use go::GoParser;
pub use javascript::JavaScriptParser;
pub use python::PythonParser;
pub use rust::RustParser;

use crate::language::Language;
use crate::parser::SourceParser;

/// Parser implementation for a language
pub fn parser_for(language: Language) -> Box<dyn SourceParser> {
    match language {
        Language::Python => Box::new(PythonParser),
        Language::Rust => Box::new(RustParser),
        Language::Go => Box::new(GoParser),
        Language::JavaScript | Language::TypeScript | Language::Tsx => {
            Box::new(JavaScriptParser::new(language))
        }
    }
}
