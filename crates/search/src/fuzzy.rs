use nucleo_matcher::pattern::{CaseMatching, Normalization, Pattern};
use nucleo_matcher::{Matcher, Utf32String};

/// Fuzzy name similarity using nucleo-matcher.
///
/// Only used to refine candidates that already matched on keywords; a fuzzy
/// hit alone never makes a symbol a result.
pub struct FuzzyScorer {
    matcher: Matcher,
}

impl FuzzyScorer {
    pub fn new() -> Self {
        Self {
            matcher: Matcher::new(nucleo_matcher::Config::DEFAULT),
        }
    }

    /// Score each name against `query`, normalized to 0..=1 by the best hit
    pub fn score_names<'n>(&mut self, query: &str, names: impl IntoIterator<Item = &'n str>) -> Vec<f32> {
        let pattern = Pattern::parse(query, CaseMatching::Smart, Normalization::Smart);
        let raw: Vec<u32> = names
            .into_iter()
            .map(|name| {
                let haystack = Utf32String::from(name);
                pattern
                    .score(haystack.slice(..), &mut self.matcher)
                    .unwrap_or(0)
            })
            .collect();

        // Normalize scores to 0-1 range (nucleo scores are u32)
        let max_score = raw.iter().copied().max().unwrap_or(0);
        raw.into_iter()
            .map(|score| {
                if max_score > 0 {
                    score as f32 / max_score as f32
                } else {
                    0.0
                }
            })
            .collect()
    }
}

impl Default for FuzzyScorer {
    fn default() -> Self {
        Self::new()
    }
}
