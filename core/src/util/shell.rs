//! Shell quoting for generated scripts.

fn is_safe(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            '_' | '-' | '.' | '/' | ',' | ':' | '=' | '+' | '@' | '%'
        )
}

/// Quote `s` for a POSIX shell, leaving plain words untouched.
pub fn quote(s: &str) -> String {
    if !s.is_empty() && s.chars().all(is_safe) {
        return s.to_string();
    }
    format!("'{}'", s.replace('\'', r"'\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_words_pass_through() {
        assert_eq!(quote("L2"), "L2");
        assert_eq!(quote("/data/train.conll"), "/data/train.conll");
        assert_eq!(quote("0.05"), "0.05");
    }

    #[test]
    fn quotes_spaces_and_quotes() {
        assert_eq!(quote("a b"), "'a b'");
        assert_eq!(quote("it's"), r"'it'\''s'");
        assert_eq!(quote(""), "''");
    }
}
