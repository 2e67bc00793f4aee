//! Line-oriented extraction helpers over captured stdout.
//!
//! None of these fail on missing input: an absent line is `None`.

use regex::Regex;

use crate::config::Occurrence;

fn pick<T>(mut found: impl Iterator<Item = T>, occurrence: Occurrence) -> Option<T> {
    match occurrence {
        Occurrence::First => found.next(),
        Occurrence::Last => found.last(),
    }
}

/// Text after `literal` on the first/last line containing it, trimmed.
pub fn following_literal<'a>(
    lines: &[&'a str],
    literal: &str,
    occurrence: Occurrence,
) -> Option<&'a str> {
    let found = lines
        .iter()
        .filter_map(|line| line.find(literal).map(|pos| line[pos + literal.len()..].trim()));
    pick(found, occurrence)
}

/// First capture group of `re` on the first/last matching line.
pub fn first_group<'a>(lines: &[&'a str], re: &Regex, occurrence: Occurrence) -> Option<&'a str> {
    pick(all_first_groups(lines, re).into_iter(), occurrence)
}

/// First capture group of every matching line, in order.
pub fn all_first_groups<'a>(lines: &[&'a str], re: &Regex) -> Vec<&'a str> {
    lines
        .iter()
        .filter_map(|line| re.captures(line).and_then(|c| c.get(1)).map(|m| m.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = "\
Loading data
Accuracy on dev: 0.81
Accuracy on dev: 0.85
Accuracy on test: 0.84
real\t1m2.5s";

    #[test]
    fn literal_first_and_last() {
        let lines: Vec<&str> = LOG.lines().collect();
        assert_eq!(
            following_literal(&lines, "Accuracy on dev:", Occurrence::First),
            Some("0.81")
        );
        assert_eq!(
            following_literal(&lines, "Accuracy on dev:", Occurrence::Last),
            Some("0.85")
        );
        assert_eq!(following_literal(&lines, "F1 on test:", Occurrence::Last), None);
    }

    #[test]
    fn regex_groups() {
        let lines: Vec<&str> = LOG.lines().collect();
        let re = Regex::new(r"Accuracy on (\w+):").unwrap();
        assert_eq!(all_first_groups(&lines, &re), vec!["dev", "dev", "test"]);
        assert_eq!(first_group(&lines, &re, Occurrence::Last), Some("test"));

        let time = Regex::new(r"^real\s+(\S+)").unwrap();
        assert_eq!(first_group(&lines, &time, Occurrence::First), Some("1m2.5s"));
    }
}
