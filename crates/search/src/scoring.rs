use context_extractor::Symbol;
use std::collections::HashSet;

const NAME_WEIGHT: f32 = 3.0;
const PATH_WEIGHT: f32 = 1.5;
const DOC_WEIGHT: f32 = 1.0;

/// Partial credit relative to an exact token hit
const PREFIX_FACTOR: f32 = 0.5;
const SUBSTRING_FACTOR: f32 = 0.25;

/// Whole query equal to the symbol name
const EXACT_NAME_BONUS: f32 = 3.0;

/// Prefix and substring credit needs at least this many characters
const MIN_PARTIAL_LEN: usize = 3;

const STOPWORDS: &[&str] = &[
    "an", "and", "are", "as", "at", "be", "by", "can", "do", "does", "for", "from", "how", "in",
    "into", "is", "it", "me", "of", "on", "or", "the", "this", "to", "what", "when", "where",
    "which", "who", "why", "with",
];

/// Split free text or identifiers into lowercase search tokens.
///
/// Handles whitespace, punctuation, `snake_case`, `kebab-case`, `camelCase`
/// and `PascalCase` (`HTTPServer` -> `http`, `server`). Tokens shorter than two
/// characters and stopwords are dropped.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for word in text.split(|c: char| !c.is_alphanumeric()) {
        if word.is_empty() {
            continue;
        }
        for part in split_camel_case(word) {
            let lowered = part.to_lowercase();
            if lowered.chars().count() < 2 || STOPWORDS.contains(&lowered.as_str()) {
                continue;
            }
            tokens.push(lowered);
        }
    }
    tokens
}

/// Split camelCase or PascalCase into words
fn split_camel_case(word: &str) -> Vec<String> {
    let chars: Vec<char> = word.chars().collect();
    let mut parts = Vec::new();
    let mut current = String::new();

    for (i, &ch) in chars.iter().enumerate() {
        let prev = i.checked_sub(1).map(|p| chars[p]);
        let next = chars.get(i + 1).copied();
        let boundary = match prev {
            Some(prev) if ch.is_uppercase() => {
                prev.is_lowercase()
                    || prev.is_ascii_digit()
                    || (prev.is_uppercase() && next.is_some_and(char::is_lowercase))
            }
            Some(prev) if ch.is_ascii_digit() => !prev.is_ascii_digit(),
            _ => false,
        };
        if boundary && !current.is_empty() {
            parts.push(std::mem::take(&mut current));
        }
        current.push(ch);
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

/// Tokenized query plus its normalized full form
#[derive(Debug, Clone)]
pub struct QueryTerms {
    pub tokens: Vec<String>,
    normalized: String,
}

impl QueryTerms {
    pub fn parse(query: &str) -> Self {
        let tokens = dedup(tokenize(query));
        Self {
            normalized: query.trim().to_lowercase(),
            tokens,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

fn dedup(tokens: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    tokens.into_iter().filter(|t| seen.insert(t.clone())).collect()
}

/// One searchable field of a symbol
struct Field {
    tokens: HashSet<String>,
    raw: String,
    weight: f32,
}

impl Field {
    fn new(text: &str, weight: f32) -> Self {
        Self {
            tokens: tokenize(text).into_iter().collect(),
            raw: text.to_lowercase(),
            weight,
        }
    }

    fn score(&self, token: &str) -> f32 {
        if self.tokens.contains(token) {
            return self.weight;
        }
        if token.chars().count() < MIN_PARTIAL_LEN {
            return 0.0;
        }
        if self.tokens.iter().any(|t| t.starts_with(token)) {
            return self.weight * PREFIX_FACTOR;
        }
        if self.raw.contains(token) {
            return self.weight * SUBSTRING_FACTOR;
        }
        0.0
    }
}

/// Keyword relevance of `symbol` for `query`; zero means no match.
///
/// Each query token is scored independently against the name (simple and
/// qualified), the file path and the docstring, and the results are summed.
pub fn keyword_score(query: &QueryTerms, symbol: &Symbol) -> f32 {
    if query.is_empty() {
        return 0.0;
    }
    let names = format!("{} {}", symbol.name, symbol.qualified_name);
    let fields = [
        Field::new(&names, NAME_WEIGHT),
        Field::new(&symbol.file_path, PATH_WEIGHT),
        Field::new(symbol.docstring.as_deref().unwrap_or_default(), DOC_WEIGHT),
    ];

    let mut score: f32 = query
        .tokens
        .iter()
        .map(|token| fields.iter().map(|field| field.score(token)).sum::<f32>())
        .sum();
    if score > 0.0 && symbol.name.to_lowercase() == query.normalized {
        score += EXACT_NAME_BONUS;
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use context_extractor::SymbolExtractor;
    use pretty_assertions::assert_eq;

    fn symbol(path: &str, src: &str, id: &str) -> Symbol {
        SymbolExtractor::default()
            .extract(path, src.as_bytes())
            .symbols
            .into_iter()
            .find(|s| s.id == id)
            .unwrap()
    }

    #[test]
    fn tokenizes_identifiers_and_prose() {
        assert_eq!(tokenize("check_stock"), vec!["check", "stock"]);
        assert_eq!(tokenize("getUserByID"), vec!["get", "user", "id"]);
        assert_eq!(tokenize("HTTPServer"), vec!["http", "server"]);
        assert_eq!(
            tokenize("How does the login flow work?"),
            vec!["login", "flow", "work"]
        );
        assert_eq!(tokenize("src/auth-service.ts"), vec!["src", "auth", "service", "ts"]);
        assert!(tokenize("a of the").is_empty());
    }

    #[test]
    fn name_hits_outweigh_path_and_doc_hits() {
        let login = symbol(
            "auth/session.py",
            "def login(user):\n    \"\"\"Start a session.\"\"\"\n    pass\n",
            "function:auth/session.py:login",
        );
        let helper = symbol(
            "auth/login.py",
            "def helper():\n    \"\"\"Used by login.\"\"\"\n    pass\n",
            "function:auth/login.py:helper",
        );
        let query = QueryTerms::parse("login");
        let login_score = keyword_score(&query, &login);
        let helper_score = keyword_score(&query, &helper);
        assert_eq!(login_score, NAME_WEIGHT + EXACT_NAME_BONUS);
        assert_eq!(helper_score, PATH_WEIGHT + DOC_WEIGHT);
        assert!(login_score > helper_score);
    }

    #[test]
    fn partial_matches_earn_partial_credit() {
        let stock = symbol(
            "inventory.py",
            "def check_stock_levels():\n    pass\n",
            "function:inventory.py:check_stock_levels",
        );
        assert_eq!(
            keyword_score(&QueryTerms::parse("stock check"), &stock),
            2.0 * NAME_WEIGHT
        );
        assert_eq!(
            keyword_score(&QueryTerms::parse("lev"), &stock),
            NAME_WEIGHT * PREFIX_FACTOR
        );
        assert_eq!(
            keyword_score(&QueryTerms::parse("ventor"), &stock),
            PATH_WEIGHT * SUBSTRING_FACTOR
        );
        assert_eq!(keyword_score(&QueryTerms::parse("refactor login"), &stock), 0.0);
    }
}
