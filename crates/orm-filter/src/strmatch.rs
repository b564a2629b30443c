//! Shared string-matching semantics for the `like`/`ilike` family:
//! `%…%` = substring, `prefix%` = starts-with, `%suffix`
//! = ends-with, no wildcards = exact match. Case-insensitivity is ASCII
//! lowercasing; substring matching is code-point based (not byte-based),
//! so it works correctly on multi-byte UTF-8 text.

pub fn like_match(value: &str, pattern: &str, case_insensitive: bool) -> bool {
    let (value, pattern) = if case_insensitive {
        (value.to_ascii_lowercase(), pattern.to_ascii_lowercase())
    } else {
        (value.to_string(), pattern.to_string())
    };

    let leading = pattern.starts_with('%');
    let trailing = pattern.ends_with('%');

    match (leading, trailing) {
        (true, true) if pattern.chars().count() >= 2 => {
            let inner: String = pattern.chars().skip(1).take(pattern.chars().count() - 2).collect();
            value.contains(&inner)
        }
        (false, true) => {
            let prefix: String = pattern.chars().take(pattern.chars().count() - 1).collect();
            value.starts_with(&prefix)
        }
        (true, false) => {
            let suffix: String = pattern.chars().skip(1).collect();
            value.ends_with(&suffix)
        }
        _ => value == pattern,
    }
}

pub fn starts_with_match(value: &str, pattern: &str) -> bool {
    value.starts_with(pattern)
}

pub fn ends_with_match(value: &str, pattern: &str) -> bool {
    value.ends_with(pattern)
}

pub fn contains_match(value: &str, pattern: &str) -> bool {
    value.contains(pattern)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substring_wildcard() {
        assert!(like_match("hello world", "%lo wo%", false));
        assert!(!like_match("hello world", "%xyz%", false));
    }

    #[test]
    fn prefix_wildcard() {
        assert!(like_match("hello", "hel%", false));
        assert!(!like_match("hello", "xyz%", false));
    }

    #[test]
    fn suffix_wildcard() {
        assert!(like_match("hello", "%llo", false));
    }

    #[test]
    fn exact_match_no_wildcards() {
        assert!(like_match("hello", "hello", false));
        assert!(!like_match("hello", "hell", false));
    }

    #[test]
    fn case_insensitive_is_ascii_lowercase() {
        assert!(like_match("HELLO", "hello", true));
        assert!(!like_match("HELLO", "hello", false));
    }

    #[test]
    fn substring_is_codepoint_based() {
        assert!(contains_match("café logs", "é l"));
    }
}
