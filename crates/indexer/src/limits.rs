const MAX_INDEX_CONCURRENCY: usize = 32;

pub const INDEX_CONCURRENCY_ENV: &str = "CONTEXT_AWARE_INDEX_CONCURRENCY";

/// Extraction is CPU-bound; a high fan-out only adds memory pressure
fn default_index_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .clamp(2, 8)
}

fn parse_index_concurrency(raw: Option<&str>, default_value: usize) -> usize {
    raw.map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default_value)
        .clamp(1, MAX_INDEX_CONCURRENCY)
}

/// Worker count for one pass: the environment wins over the project config,
/// which wins over the machine-derived default.
pub fn resolve_index_concurrency(configured: Option<usize>) -> usize {
    let raw = std::env::var(INDEX_CONCURRENCY_ENV).ok();
    let fallback = configured.unwrap_or_else(default_index_concurrency);
    parse_index_concurrency(raw.as_deref(), fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_index_concurrency_defaults_and_clamps() {
        let default_value = default_index_concurrency();
        assert_eq!(parse_index_concurrency(None, default_value), default_value);
        assert_eq!(
            parse_index_concurrency(Some("   "), default_value),
            default_value
        );
        assert_eq!(parse_index_concurrency(Some("2"), default_value), 2);
        assert_eq!(parse_index_concurrency(Some("0"), default_value), 1);
        assert_eq!(
            parse_index_concurrency(Some("999"), default_value),
            MAX_INDEX_CONCURRENCY
        );
        assert_eq!(
            parse_index_concurrency(Some("abc"), default_value),
            default_value
        );
        assert_eq!(parse_index_concurrency(Some(" 5 "), default_value), 5);
        assert_eq!(parse_index_concurrency(None, 64), MAX_INDEX_CONCURRENCY);
    }
}
