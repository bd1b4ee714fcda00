//! Object name pattern lists
//!
//! A list such as `APP.*,!APP.TEMP*` is split on commas. Entries starting
//! with `!` exclude names; `*` matches any run of characters. The broker can
//! wildcard a request itself, but it has no exclusion syntax, so a list with
//! exclusions is resolved against a names inquiry on the collector side.

use regex::Regex;

#[derive(Debug, Clone)]
struct Glob {
    text: String,
    regex: Regex,
}

impl Glob {
    fn compile(text: &str) -> Option<Self> {
        let body = text
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");
        let regex = Regex::new(&format!("^{body}$")).ok()?;
        Some(Self {
            text: text.to_string(),
            regex,
        })
    }

    fn matches(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }
}

/// Parsed include and exclude patterns for one object class
#[derive(Debug, Clone, Default)]
pub struct PatternList {
    includes: Vec<Glob>,
    excludes: Vec<Glob>,
}

impl PatternList {
    pub fn parse(list: &str) -> Self {
        let mut patterns = Self::default();
        for entry in list.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            match entry.strip_prefix('!') {
                Some(rest) => {
                    if let Some(g) = Glob::compile(rest.trim()) {
                        patterns.excludes.push(g);
                    }
                }
                None => {
                    if let Some(g) = Glob::compile(entry) {
                        patterns.includes.push(g);
                    }
                }
            }
        }
        patterns
    }

    /// Include patterns as sent to the broker. A list holding only
    /// exclusions means "everything except".
    pub fn includes(&self) -> Vec<&str> {
        if self.includes.is_empty() && !self.excludes.is_empty() {
            return vec!["*"];
        }
        self.includes.iter().map(|g| g.text.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.includes.is_empty() && self.excludes.is_empty()
    }

    pub fn has_excludes(&self) -> bool {
        !self.excludes.is_empty()
    }

    pub fn excludes(&self, name: &str) -> bool {
        self.excludes.iter().any(|g| g.matches(name))
    }

    /// Name passes at least one include and no exclude
    pub fn matches(&self, name: &str) -> bool {
        let included = self.includes.is_empty() && !self.excludes.is_empty()
            || self.includes.iter().any(|g| g.matches(name));
        included && !self.excludes(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_trims_and_splits() {
        let p = PatternList::parse(" APP.* , !APP.TEMP* ,SYSTEM.ADMIN.COMMAND.QUEUE,");
        assert_eq!(p.includes(), vec!["APP.*", "SYSTEM.ADMIN.COMMAND.QUEUE"]);
        assert!(p.has_excludes());
        assert!(p.matches("APP.IN"));
        assert!(!p.matches("APP.TEMP.1"));
        assert!(p.matches("SYSTEM.ADMIN.COMMAND.QUEUE"));
        assert!(!p.matches("OTHER"));
    }

    #[test]
    fn test_only_excludes_means_everything_else() {
        let p = PatternList::parse("!SYSTEM.*");
        assert_eq!(p.includes(), vec!["*"]);
        assert!(p.matches("APP.IN"));
        assert!(!p.matches("SYSTEM.DEAD.LETTER"));
    }

    #[test]
    fn test_empty_list() {
        let p = PatternList::parse("  , ");
        assert!(p.is_empty());
        assert!(p.includes().is_empty());
        assert!(!p.matches("ANY"));
    }

    #[test]
    fn test_regex_characters_are_literal() {
        let p = PatternList::parse("A.B");
        assert!(p.matches("A.B"));
        assert!(!p.matches("AXB"));
    }

    proptest! {
        #[test]
        fn star_matches_every_name(name in "[A-Z0-9._]{1,48}") {
            prop_assert!(PatternList::parse("*").matches(&name));
        }

        #[test]
        fn exclusion_wins(name in "[A-Z0-9._]{1,48}") {
            let p = PatternList::parse(&format!("*,!{name}"));
            prop_assert!(!p.matches(&name));
        }
    }
}
