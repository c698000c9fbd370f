//! Ticker symbol normalization.

/// Canonical separator between a symbol and its share-class suffix.
pub const CLASS_SEPARATOR: char = '.';

const MAX_BASE_LEN: usize = 5;
const MAX_SUFFIX_LEN: usize = 3;

/// Normalize a raw token into its canonical symbol form.
///
/// Uppercases, drops a leading `$`, strips trailing punctuation and emoji, and
/// collapses `-`, `/` or a space before a class suffix into [`CLASS_SEPARATOR`].
/// Returns `None` when the result is outside the 1–5 letter bound.
pub fn normalize_symbol(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('$').unwrap_or(trimmed);
    let trimmed = trimmed.trim_end_matches(|c: char| !c.is_ascii_alphanumeric());

    let (base, suffix) = match trimmed.find(['.', '-', '/', ' ']) {
        Some(idx) => {
            let (base, rest) = trimmed.split_at(idx);
            (base, Some(rest[1..].trim_start()))
        }
        None => (trimmed, None),
    };

    if base.is_empty() || base.len() > MAX_BASE_LEN || !base.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    let mut symbol = base.to_ascii_uppercase();
    if let Some(suffix) = suffix {
        if suffix.is_empty()
            || suffix.len() > MAX_SUFFIX_LEN
            || !suffix.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return None;
        }
        symbol.push(CLASS_SEPARATOR);
        symbol.push_str(&suffix.to_ascii_uppercase());
    }
    Some(symbol)
}

/// The symbol without any class suffix.
pub fn base_symbol(symbol: &str) -> &str {
    symbol.split(CLASS_SEPARATOR).next().unwrap_or(symbol)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uppercases_and_strips_cashtag() {
        assert_eq!(normalize_symbol("$xpon").as_deref(), Some("XPON"));
        assert_eq!(normalize_symbol("Sldp").as_deref(), Some("SLDP"));
    }

    #[test]
    fn test_class_separators_collapse() {
        assert_eq!(normalize_symbol("BRK.B").as_deref(), Some("BRK.B"));
        assert_eq!(normalize_symbol("brk-b").as_deref(), Some("BRK.B"));
        assert_eq!(normalize_symbol("BRK B").as_deref(), Some("BRK.B"));
        assert_eq!(normalize_symbol("BF/A").as_deref(), Some("BF.A"));
    }

    #[test]
    fn test_trailing_punctuation_and_emoji() {
        assert_eq!(normalize_symbol("XPON!!").as_deref(), Some("XPON"));
        assert_eq!(normalize_symbol("XPON🚀").as_deref(), Some("XPON"));
        assert_eq!(normalize_symbol("BRK.B,").as_deref(), Some("BRK.B"));
    }

    #[test]
    fn test_length_bounds() {
        assert_eq!(normalize_symbol("F").as_deref(), Some("F"));
        assert!(normalize_symbol("TOOLONG").is_none());
        assert!(normalize_symbol("").is_none());
        assert!(normalize_symbol("$").is_none());
        assert!(normalize_symbol("AB1").is_none());
        assert!(normalize_symbol("BRK.ABCD").is_none());
    }

    #[test]
    fn test_base_symbol() {
        assert_eq!(base_symbol("BRK.B"), "BRK");
        assert_eq!(base_symbol("XPON"), "XPON");
    }
}
