//! WHERE / HAVING accumulator entries
//!
//! Entries stay structured until render time so that the operator spelling
//! can follow the dialect of the session doing the rendering.

use crate::dialect::Dialect;
use crate::error::{CoreError, Result};
use crate::expr::{ArgumentValue, Expression};
use crate::operator::Operator;
use crate::scope::Junction;

/// One predicate in a WHERE or HAVING clause
#[derive(Debug, Clone, PartialEq)]
pub enum WhereEntry {
    /// `field op value`; a missing operator is the two-argument form, which
    /// picks `=`, `in` or `is null` from the value
    Condition {
        field: ArgumentValue,
        operator: Option<Operator>,
        value: ArgumentValue,
    },
    /// A self-contained boolean fragment
    Expression(ArgumentValue),
    /// A parenthesized AND/OR group
    Group {
        junction: Junction,
        entries: Vec<WhereEntry>,
    },
}

impl WhereEntry {
    pub fn condition(
        field: impl Into<ArgumentValue>,
        operator: Option<Operator>,
        value: impl Into<ArgumentValue>,
    ) -> Self {
        WhereEntry::Condition {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    pub fn expression(expr: impl Into<ArgumentValue>) -> Self {
        WhereEntry::Expression(expr.into())
    }

    pub fn group(junction: Junction, entries: Vec<WhereEntry>) -> Self {
        WhereEntry::Group { junction, entries }
    }

    /// Build the expression for this entry, or `None` for an empty group
    pub fn to_expression(&self, dialect: Dialect) -> Result<Option<Expression>> {
        match self {
            WhereEntry::Condition {
                field,
                operator,
                value,
            } => condition_expression(field, *operator, value, dialect).map(Some),
            WhereEntry::Expression(fragment) => {
                Ok(Some(Expression::with_args("[]", vec![fragment.clone()])))
            }
            WhereEntry::Group { junction, entries } => {
                let mut parts = Vec::with_capacity(entries.len());
                for entry in entries {
                    if let Some(expr) = entry.to_expression(dialect)? {
                        parts.push(expr);
                    }
                }
                Ok(join_group(*junction, parts))
            }
        }
    }
}

/// Join predicates with a junction; a single predicate stands alone
pub(crate) fn join_group(junction: Junction, mut parts: Vec<Expression>) -> Option<Expression> {
    match parts.len() {
        0 => None,
        1 => parts.pop(),
        n => {
            let separator = format!(" {} ", junction.as_sql());
            let template = vec!["[]"; n].join(&separator);
            Some(
                Expression::with_args(template, parts.into_iter().map(ArgumentValue::from).collect())
                    .wrapped(),
            )
        }
    }
}

fn condition_expression(
    field: &ArgumentValue,
    operator: Option<Operator>,
    value: &ArgumentValue,
    dialect: Dialect,
) -> Result<Expression> {
    let field = field.clone();

    if value.is_null() {
        let op = operator.unwrap_or(Operator::Eq);
        if op.is_ordering() {
            return Err(CoreError::UnsupportedNullComparison {
                field: field.describe(),
                operator: op,
            });
        }
        let template = if op.is_negative() {
            "{{}} is not null"
        } else {
            "{{}} is null"
        };
        return Ok(Expression::with_args(template, vec![field]));
    }

    if value.is_list() {
        let negated = match operator {
            None | Some(Operator::Eq) | Some(Operator::In) => false,
            Some(Operator::Neq) | Some(Operator::NotIn) => true,
            Some(op) => {
                return Err(CoreError::InvalidValue(format!(
                    "list value {} is not supported with operator {}",
                    value.describe(),
                    op
                )))
            }
        };
        // Empty membership collapses to a tautology every dialect accepts
        if value.is_empty_list() {
            return Ok(Expression::new(if negated { "1 = 1" } else { "1 = 0" }));
        }
        let template = if negated { "{{}} not in []" } else { "{{}} in []" };
        return Ok(Expression::with_args(template, vec![field, value.clone()]));
    }

    let op = operator.unwrap_or(Operator::Eq);
    let value = match (op, value) {
        (Operator::In | Operator::NotIn, ArgumentValue::Literal(scalar)) => {
            ArgumentValue::List(vec![ArgumentValue::Literal(scalar.clone())])
        }
        _ => value.clone(),
    };
    Ok(Expression::with_args(operator_template(op, dialect), vec![field, value]))
}

fn operator_template(op: Operator, dialect: Dialect) -> &'static str {
    match (op, dialect) {
        (Operator::Like, Dialect::Postgres) => "{{}} ilike []",
        (Operator::NotLike, Dialect::Postgres) => "{{}} not ilike []",
        // MySQL escapes with `\` already; everyone else needs it spelled out
        (Operator::Like, Dialect::MySql) => "{{}} like []",
        (Operator::NotLike, Dialect::MySql) => "{{}} not like []",
        (Operator::Regexp, Dialect::Postgres) => "{{}} ~ []",
        (Operator::NotRegexp, Dialect::Postgres) => "{{}} !~ []",
        (Operator::Regexp, Dialect::Oracle) => "regexp_like({{}}, [])",
        (Operator::NotRegexp, Dialect::Oracle) => "not regexp_like({{}}, [])",
        (Operator::Eq, _) => "{{}} = []",
        (Operator::Neq, _) => "{{}} != []",
        (Operator::Gt, _) => "{{}} > []",
        (Operator::Gte, _) => "{{}} >= []",
        (Operator::Lt, _) => "{{}} < []",
        (Operator::Lte, _) => "{{}} <= []",
        (Operator::Like, _) => r"{{}} like [] escape '\'",
        (Operator::NotLike, _) => r"{{}} not like [] escape '\'",
        (Operator::In, _) => "{{}} in []",
        (Operator::NotIn, _) => "{{}} not in []",
        (Operator::Regexp, _) => "{{}} regexp []",
        (Operator::NotRegexp, _) => "{{}} not regexp []",
    }
}
