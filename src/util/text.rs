use hashbrown::HashSet;
use once_cell::sync::Lazy;
use regex::Regex;

/// 股票代號之間可以用逗號或空白分隔
static SYMBOL_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[,\s]+").expect("Failed to compile symbol separator regex"));

/// Splits a delimited symbol list into trimmed, non-empty, distinct symbols.
///
/// Order follows the first occurrence; comparison ignores ASCII case so
/// `aapl` and `AAPL` collapse into whichever was written first.
pub fn split_symbols(input: &str) -> Vec<String> {
    let mut seen = HashSet::new();

    SYMBOL_SEPARATOR
        .split(input.trim())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.to_ascii_uppercase()))
        .map(str::to_string)
        .collect()
}
