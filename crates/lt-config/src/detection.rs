//! Compiled detection rules.
//!
//! These types are the validated form of the `threshold` / `state_change`
//! sections of the input document. Predicates are explicit tagged variants
//! evaluated against typed column values; no user-supplied text is ever
//! interpolated into an expression.

use crate::validate::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Comparison operator of a threshold rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cmp {
    Gt,
    Lt,
    Ge,
    Le,
    Eq,
}

impl Cmp {
    /// Parse the operator spelling used in configuration documents.
    pub fn parse(op: &str) -> Result<Self, ValidationError> {
        match op.trim() {
            ">" => Ok(Cmp::Gt),
            "<" => Ok(Cmp::Lt),
            ">=" => Ok(Cmp::Ge),
            "<=" => Ok(Cmp::Le),
            "=" => Ok(Cmp::Eq),
            other => Err(ValidationError::InvalidOperator(other.to_string())),
        }
    }

    /// Apply the comparison to a cell value and the rule's threshold.
    pub fn eval(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Cmp::Gt => lhs > rhs,
            Cmp::Lt => lhs < rhs,
            Cmp::Ge => lhs >= rhs,
            Cmp::Le => lhs <= rhs,
            Cmp::Eq => lhs == rhs,
        }
    }
}

impl fmt::Display for Cmp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Cmp::Gt => ">",
            Cmp::Lt => "<",
            Cmp::Ge => ">=",
            Cmp::Le => "<=",
            Cmp::Eq => "=",
        };
        write!(f, "{s}")
    }
}

/// How matches from multiple threshold rules combine within one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombinePolicy {
    /// A row matches if any rule holds (the default).
    #[default]
    Any,
    /// A row matches only if every rule whose column is present holds.
    All,
}

impl CombinePolicy {
    pub fn parse(policy: &str) -> Result<Self, ValidationError> {
        match policy.trim() {
            "any" => Ok(CombinePolicy::Any),
            "all" => Ok(CombinePolicy::All),
            other => Err(ValidationError::InvalidCombinePolicy(other.to_string())),
        }
    }
}

/// A configured state-change comparison value: numeric or text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleValue {
    Number(f64),
    Text(String),
}

impl RuleValue {
    /// Numeric view, parsing text values on demand.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            RuleValue::Number(n) => Some(*n),
            RuleValue::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }

    pub fn as_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for RuleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleValue::Number(n) => write!(f, "{n}"),
            RuleValue::Text(s) => write!(f, "{s}"),
        }
    }
}

/// A compiled threshold rule: `column op value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdRule {
    pub column: String,
    pub op: Cmp,
    pub value: f64,
}

/// A compiled state-change rule: a transition between `value_a` and
/// `value_b` on consecutive rows, in either direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateChangeRule {
    pub column: String,
    pub value_a: RuleValue,
    pub value_b: RuleValue,
}

/// Rows retained around each match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSpec {
    pub rows_before: usize,
    pub rows_after: usize,
}

impl WindowSpec {
    pub fn new(rows_before: usize, rows_after: usize) -> Self {
        Self {
            rows_before,
            rows_after,
        }
    }

    /// Both sides zero: the window for a match is exactly the matched row.
    pub fn is_pass_through(&self) -> bool {
        self.rows_before == 0 && self.rows_after == 0
    }
}

/// The full, immutable detection rule set for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub thresholds: Vec<ThresholdRule>,
    pub combine: CombinePolicy,
    pub state_changes: Vec<StateChangeRule>,
    pub extra_columns: Vec<String>,
    pub window: WindowSpec,
    pub detailed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    // === Cmp ===

    #[test]
    fn test_cmp_parse_all_operators() {
        assert_eq!(Cmp::parse(">").unwrap(), Cmp::Gt);
        assert_eq!(Cmp::parse("<").unwrap(), Cmp::Lt);
        assert_eq!(Cmp::parse(">=").unwrap(), Cmp::Ge);
        assert_eq!(Cmp::parse("<=").unwrap(), Cmp::Le);
        assert_eq!(Cmp::parse("=").unwrap(), Cmp::Eq);
    }

    #[test]
    fn test_cmp_parse_trims_whitespace() {
        assert_eq!(Cmp::parse(" >= ").unwrap(), Cmp::Ge);
    }

    #[test]
    fn test_cmp_parse_unknown_operator() {
        let err = Cmp::parse("!=").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidOperator(op) if op == "!="));
    }

    #[test]
    fn test_cmp_eval() {
        assert!(Cmp::Gt.eval(2.0, 1.0));
        assert!(!Cmp::Gt.eval(1.0, 1.0));
        assert!(Cmp::Ge.eval(1.0, 1.0));
        assert!(Cmp::Lt.eval(0.5, 1.0));
        assert!(Cmp::Le.eval(1.0, 1.0));
        assert!(Cmp::Eq.eval(1.0, 1.0));
        assert!(!Cmp::Eq.eval(1.0, 1.1));
    }

    #[test]
    fn test_cmp_display_round_trips() {
        for op in [Cmp::Gt, Cmp::Lt, Cmp::Ge, Cmp::Le, Cmp::Eq] {
            assert_eq!(Cmp::parse(&op.to_string()).unwrap(), op);
        }
    }

    // === CombinePolicy ===

    #[test]
    fn test_combine_policy_parse() {
        assert_eq!(CombinePolicy::parse("any").unwrap(), CombinePolicy::Any);
        assert_eq!(CombinePolicy::parse("all").unwrap(), CombinePolicy::All);
        assert!(CombinePolicy::parse("either").is_err());
    }

    #[test]
    fn test_combine_policy_default_is_any() {
        assert_eq!(CombinePolicy::default(), CombinePolicy::Any);
    }

    // === RuleValue ===

    #[test]
    fn test_rule_value_numeric_view() {
        assert_eq!(RuleValue::Number(1.0).as_number(), Some(1.0));
        assert_eq!(RuleValue::Text("3.5".into()).as_number(), Some(3.5));
        assert_eq!(RuleValue::Text("open".into()).as_number(), None);
    }

    #[test]
    fn test_rule_value_deserializes_untagged() {
        let n: RuleValue = serde_json::from_str("1").unwrap();
        let s: RuleValue = serde_json::from_str("\"open\"").unwrap();
        assert_eq!(n, RuleValue::Number(1.0));
        assert_eq!(s, RuleValue::Text("open".into()));
    }

    // === WindowSpec ===

    #[test]
    fn test_window_pass_through_only_when_both_zero() {
        assert!(WindowSpec::new(0, 0).is_pass_through());
        assert!(!WindowSpec::new(1, 0).is_pass_through());
        assert!(!WindowSpec::new(0, 1).is_pass_through());
    }
}
