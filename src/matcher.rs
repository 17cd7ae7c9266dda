use std::collections::HashMap;

/// Request parameters: parameter key to its value.
pub type Params = HashMap<String, String>;

/// The condition part of a `RuleSet`.
///
/// `MatchAll` is the explicit wildcard (`"*"` in a definition). It is kept
/// apart from an empty `All` list even though both match every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conditions {
    MatchAll,
    All(Vec<Condition>),
}

impl Conditions {
    /// Every condition must match, evaluated in declaration order.
    pub fn matches(&self, params: &Params) -> bool {
        match self {
            Conditions::MatchAll => true,
            Conditions::All(conditions) => conditions.iter().all(|c| c.matches(params)),
        }
    }

    pub fn is_match_all(&self) -> bool {
        matches!(self, Conditions::MatchAll)
    }
}

impl Default for Conditions {
    fn default() -> Self {
        Conditions::All(Vec::new())
    }
}

impl From<Vec<Condition>> for Conditions {
    fn from(conditions: Vec<Condition>) -> Self {
        Conditions::All(conditions)
    }
}

/// A single predicate over request parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Parameter must be present, its value is irrelevant.
    Present { key: String },
    /// Parameter must be present and hold an accepted value.
    Equals { key: String, accepted: Accepted },
}

impl Condition {
    pub fn present(key: impl Into<String>) -> Self {
        Condition::Present { key: key.into() }
    }

    pub fn one_of<I, S>(key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Condition::Equals {
            key: key.into(),
            accepted: Accepted::OneOf(values.into_iter().map(Into::into).collect()),
        }
    }

    pub fn any(key: impl Into<String>) -> Self {
        Condition::Equals {
            key: key.into(),
            accepted: Accepted::Any,
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Condition::Present { key } | Condition::Equals { key, .. } => key,
        }
    }

    pub fn matches(&self, params: &Params) -> bool {
        match self {
            Condition::Present { key } => params.contains_key(key),
            Condition::Equals { key, accepted } => {
                params.get(key).is_some_and(|value| accepted.contains(value))
            }
        }
    }
}

/// Values accepted by a key-value condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Accepted {
    /// Wildcard: any value, as long as the key is present.
    Any,
    OneOf(Vec<String>),
}

impl Accepted {
    pub fn contains(&self, value: &str) -> bool {
        match self {
            Accepted::Any => true,
            Accepted::OneOf(values) => values.iter().any(|v| v == value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test_case(&[("action", "eat")], true ; "key present")]
    #[test_case(&[("action", "")], true ; "key present with empty value")]
    #[test_case(&[("other", "eat")], false ; "other key only")]
    #[test_case(&[], false ; "no params")]
    fn present_condition_ignores_value(pairs: &[(&str, &str)], expected: bool) {
        let condition = Condition::present("action");
        assert_eq!(expected, condition.matches(&params(pairs)));
    }

    #[test_case(&[("action", "eat")], true ; "first accepted value")]
    #[test_case(&[("action", "clean")], true ; "second accepted value")]
    #[test_case(&[("action", "destroy")], false ; "value not accepted")]
    #[test_case(&[("action", "Eat")], false ; "comparison is case sensitive")]
    #[test_case(&[("verb", "eat")], false ; "key missing")]
    fn one_of_condition_requires_member(pairs: &[(&str, &str)], expected: bool) {
        let condition = Condition::one_of("action", vec!["eat", "clean"]);
        assert_eq!(expected, condition.matches(&params(pairs)));
    }

    #[test]
    fn any_condition_still_requires_key() {
        let condition = Condition::any("action");
        assert!(condition.matches(&params(&[("action", "whatever")])));
        assert!(!condition.matches(&params(&[])));
    }

    #[test]
    fn conditions_are_a_conjunction() {
        let conditions = Conditions::from(vec![
            Condition::present("token"),
            Condition::one_of("action", vec!["read"]),
        ]);

        assert!(conditions.matches(&params(&[("token", "x"), ("action", "read")])));
        assert!(!conditions.matches(&params(&[("token", "x"), ("action", "write")])));
        assert!(!conditions.matches(&params(&[("action", "read")])));
    }

    #[test]
    fn wildcard_and_empty_list_both_match_but_differ() {
        let empty = Conditions::default();
        assert!(Conditions::MatchAll.matches(&Params::new()));
        assert!(empty.matches(&Params::new()));
        assert_ne!(Conditions::MatchAll, empty);
        assert!(Conditions::MatchAll.is_match_all());
        assert!(!empty.is_match_all());
    }
}
