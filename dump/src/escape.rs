/// Escape `\`, newline, and space so a value can share a line with
/// whitespace-delimited neighbors.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            ' ' => out.push_str("\\ "),
            other => out.push(other),
        }
    }
    out
}

/// Inverse of [`escape`]. An escape sequence this function doesn't
/// recognize, or a trailing lone `\`, is passed through unchanged rather
/// than treated as an error: dumps are meant to be read by lenient,
/// forward-compatible tooling.
pub fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some(' ') => out.push(' '),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn escapes_backslash_newline_and_space() {
        assert_eq!(escape("a\\b c\nd"), "a\\\\b\\ c\\nd");
    }

    #[test]
    fn unescape_reverses_escape() {
        for s in ["plain", "has space", "back\\slash", "line\nbreak", "  lead  trail  "] {
            assert_eq!(unescape(&escape(s)), s);
        }
    }

    #[test]
    fn unescape_passes_through_unknown_sequences() {
        assert_eq!(unescape("a\\qb"), "a\\qb");
    }

    #[test]
    fn unescape_passes_through_trailing_backslash() {
        assert_eq!(unescape("trailing\\"), "trailing\\");
    }
}
