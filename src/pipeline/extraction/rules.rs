//! Named extraction rules and the two ways of evaluating them.
//!
//! A cascade is an ordered slice of rules: the first rule that matches wins.
//! Collectors run a single rule over the whole text and keep every match.

use regex::Regex;

/// A compiled pattern with a stable name, so cascades can be inspected and
/// tested rule by rule.
pub struct ExtractionRule {
    pub name: &'static str,
    regex: Regex,
}

/// Value produced by a cascade together with the rule that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch {
    pub rule: &'static str,
    pub value: String,
}

impl ExtractionRule {
    /// Compile a rule. Patterns are static literals, so a failure is a
    /// programming error caught by the cascade tests.
    pub fn new(name: &'static str, pattern: &str) -> Self {
        Self {
            name,
            regex: Regex::new(pattern).unwrap(),
        }
    }

    /// Value of the first match: capture group 1 when the pattern has one
    /// and it participated, otherwise the whole match. Trimmed; an empty
    /// value counts as no match.
    pub fn apply(&self, text: &str) -> Option<String> {
        let caps = self.regex.captures(text)?;
        let value = caps.get(1).or_else(|| caps.get(0))?.as_str().trim();
        (!value.is_empty()).then(|| value.to_string())
    }

    /// Every non-overlapping match, in text order.
    pub fn apply_all(&self, text: &str) -> Vec<String> {
        self.regex
            .captures_iter(text)
            .filter_map(|caps| caps.get(1).or_else(|| caps.get(0)))
            .map(|m| m.as_str().trim().to_string())
            .filter(|v| !v.is_empty())
            .collect()
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

/// Evaluate a cascade in order; first successful rule wins.
pub fn first_match(text: &str, cascade: &[ExtractionRule]) -> Option<RuleMatch> {
    cascade.iter().find_map(|rule| {
        rule.apply(text).map(|value| RuleMatch {
            rule: rule.name,
            value,
        })
    })
}

/// Cascade value or the empty string.
pub fn pick_first(text: &str, cascade: &[ExtractionRule]) -> String {
    first_match(text, cascade)
        .map(|m| m.value)
        .unwrap_or_default()
}

/// Run every rule of a collector over the text, concatenate matches in rule
/// order, and drop repeats keeping the first occurrence.
pub fn collect_all(text: &str, rules: &[ExtractionRule]) -> Vec<String> {
    dedup_preserving_order(rules.iter().flat_map(|rule| rule.apply_all(text)))
}

/// True when any rule in the list matches anywhere in the text.
pub fn any_match(text: &str, rules: &[ExtractionRule]) -> bool {
    rules.iter().any(|rule| rule.is_match(text))
}

pub fn dedup_preserving_order<I>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut out: Vec<String> = Vec::new();
    for value in values {
        if !out.contains(&value) {
            out.push(value);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cascade() -> Vec<ExtractionRule> {
        vec![
            ExtractionRule::new("labelled", r"(?i)\bcode:\s*(\w+)"),
            ExtractionRule::new("bare", r"\b[A-Z]\d{3}\b"),
        ]
    }

    #[test]
    fn first_rule_wins_when_both_match() {
        let m = first_match("Z999 and code: A111", &cascade()).unwrap();
        assert_eq!(m.rule, "labelled");
        assert_eq!(m.value, "A111");
    }

    #[test]
    fn falls_through_to_later_rule() {
        let m = first_match("only Z999 here", &cascade()).unwrap();
        assert_eq!(m.rule, "bare");
        assert_eq!(m.value, "Z999");
    }

    #[test]
    fn no_match_is_empty_string() {
        assert_eq!(pick_first("nothing", &cascade()), "");
    }

    #[test]
    fn collect_all_dedups_across_rules() {
        let rules = vec![
            ExtractionRule::new("a", r"x=(\d+)"),
            ExtractionRule::new("b", r"y=(\d+)"),
        ];
        let values = collect_all("x=1 y=2 x=3 y=1", &rules);
        assert_eq!(values, vec!["1", "3", "2"]);
    }

    #[test]
    fn dedup_keeps_first_seen_order() {
        let values = dedup_preserving_order(
            ["b", "a", "b", "c", "a"].iter().map(|s| s.to_string()),
        );
        assert_eq!(values, vec!["b", "a", "c"]);
    }
}
