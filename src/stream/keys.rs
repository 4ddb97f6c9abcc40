//! Composite key synthesis
//!
//! File totals carry no row identifier, so one is built by joining the
//! identifying fields with `|`. Backslashes and separators inside a part are
//! escaped so distinct tuples never produce the same key.

/// Separator between key parts
pub const KEY_SEPARATOR: char = '|';

/// Escape `\` and `|` in one key part
pub fn escape_key_part(part: &str) -> String {
    let mut escaped = String::with_capacity(part.len());
    for c in part.chars() {
        if c == '\\' || c == KEY_SEPARATOR {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Join parts into a composite key
pub fn composite_key<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    parts
        .into_iter()
        .map(|part| escape_key_part(part.as_ref()))
        .collect::<Vec<_>>()
        .join(&KEY_SEPARATOR.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_plain_parts_join_unchanged() {
        assert_eq!(
            composite_key(["r1", "main", "abc123", "fileA.py"]),
            "r1|main|abc123|fileA.py"
        );
    }

    #[test_case("a|b", "a\\|b" ; "separator")]
    #[test_case("a\\b", "a\\\\b" ; "backslash")]
    #[test_case("src/main.rs", "src/main.rs" ; "untouched")]
    fn test_escape_key_part(input: &str, expected: &str) {
        assert_eq!(escape_key_part(input), expected);
    }

    #[test]
    fn test_separator_in_values_does_not_collide() {
        let a = composite_key(["r1", "feat|x", "abc", "f.py"]);
        let b = composite_key(["r1", "feat", "x|abc", "f.py"]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_trailing_backslash_does_not_collide() {
        let a = composite_key(["a\\", "b"]);
        let b = composite_key(["a", "\\b"]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_key_is_deterministic() {
        let parts = ["r1", "main", "abc123", "dir/file.py"];
        assert_eq!(composite_key(parts), composite_key(parts));
    }
}
