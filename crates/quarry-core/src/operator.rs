//! Condition operators and their negation table

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Comparison operators usable in a condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    /// Equal (=)
    Eq,
    /// Not equal (!=)
    Neq,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    Gte,
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    Lte,
    /// SQL LIKE pattern
    Like,
    /// SQL NOT LIKE pattern
    NotLike,
    /// Membership in a list
    In,
    /// Not a member of a list
    NotIn,
    /// Regular expression match
    Regexp,
    /// Regular expression mismatch
    NotRegexp,
}

impl Operator {
    /// Every operator, in declaration order
    pub const ALL: [Operator; 12] = [
        Operator::Eq,
        Operator::Neq,
        Operator::Gt,
        Operator::Gte,
        Operator::Lt,
        Operator::Lte,
        Operator::Like,
        Operator::NotLike,
        Operator::In,
        Operator::NotIn,
        Operator::Regexp,
        Operator::NotRegexp,
    ];

    /// The operator selecting exactly the complement of this one.
    ///
    /// The table is a total involution: `op.negate().negate() == op`.
    pub fn negate(self) -> Operator {
        match self {
            Operator::Eq => Operator::Neq,
            Operator::Neq => Operator::Eq,
            Operator::Gt => Operator::Lte,
            Operator::Lte => Operator::Gt,
            Operator::Gte => Operator::Lt,
            Operator::Lt => Operator::Gte,
            Operator::Like => Operator::NotLike,
            Operator::NotLike => Operator::Like,
            Operator::In => Operator::NotIn,
            Operator::NotIn => Operator::In,
            Operator::Regexp => Operator::NotRegexp,
            Operator::NotRegexp => Operator::Regexp,
        }
    }

    /// Canonical SQL spelling
    pub fn as_sql(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Neq => "!=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Like => "like",
            Operator::NotLike => "not like",
            Operator::In => "in",
            Operator::NotIn => "not in",
            Operator::Regexp => "regexp",
            Operator::NotRegexp => "not regexp",
        }
    }

    /// Returns true if a list value is legal with this operator
    pub fn accepts_array(self) -> bool {
        matches!(
            self,
            Operator::Eq | Operator::Neq | Operator::In | Operator::NotIn
        )
    }

    /// Returns true for the negated half of each pair (`!=`, `not like`, ...)
    pub fn is_negative(self) -> bool {
        matches!(
            self,
            Operator::Neq | Operator::NotLike | Operator::NotIn | Operator::NotRegexp
        )
    }

    /// Returns true for `>`, `>=`, `<`, `<=`
    pub fn is_ordering(self) -> bool {
        matches!(
            self,
            Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte
        )
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for Operator {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_ascii_lowercase();

        match normalized.as_str() {
            "=" | "==" => Ok(Operator::Eq),
            "!=" | "<>" => Ok(Operator::Neq),
            ">" => Ok(Operator::Gt),
            ">=" => Ok(Operator::Gte),
            "<" => Ok(Operator::Lt),
            "<=" => Ok(Operator::Lte),
            "like" => Ok(Operator::Like),
            "not like" => Ok(Operator::NotLike),
            "in" => Ok(Operator::In),
            "not in" => Ok(Operator::NotIn),
            "regexp" => Ok(Operator::Regexp),
            "not regexp" => Ok(Operator::NotRegexp),
            _ => Err(CoreError::UnsupportedOperator(s.to_string())),
        }
    }
}
