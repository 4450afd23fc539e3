//! SQL statements composed from clause fragments
//!
//! A [`Statement`] accumulates clause fragments through builder calls and
//! renders the template registered for its [`Mode`], overridden per dialect.
//! Mode templates refer to clauses by tag (`[where]`, `[limit]`, ...); the
//! statement resolves those tags through the [`Clause`] table.

mod functions;
mod templates;
mod where_clause;

pub use functions::{concat, group_concat};
pub use templates::TemplateSet;
pub use where_clause::WhereEntry;

use crate::dialect::Dialect;
use crate::error::{CoreError, Result};
use crate::expr::{render_template, ArgumentValue, Arguments, Expression, RenderSession, Rendered, TagSource};
use crate::operator::Operator;
use crate::scope::Junction;
use crate::types::Value;
use serde::{Deserialize, Serialize};
use std::fmt;
use templates::{mode_template, LIMIT};

/// Which composed template a statement renders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Select,
    Insert,
    Update,
    Delete,
    Replace,
    Truncate,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::Select => "select",
            Mode::Insert => "insert",
            Mode::Update => "update",
            Mode::Delete => "delete",
            Mode::Replace => "replace",
            Mode::Truncate => "truncate",
        };
        f.write_str(name)
    }
}

/// Clause tags understood by statement templates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clause {
    Option,
    Field,
    From,
    TableNoAlias,
    Join,
    Where,
    Group,
    Having,
    Order,
    Limit,
    Set,
    SetFields,
    SetValues,
}

impl Clause {
    pub fn from_tag(tag: &str) -> Option<Clause> {
        Some(match tag {
            "option" => Clause::Option,
            "field" => Clause::Field,
            "from" => Clause::From,
            "table_noalias" => Clause::TableNoAlias,
            "join" => Clause::Join,
            "where" => Clause::Where,
            "group" => Clause::Group,
            "having" => Clause::Having,
            "order" => Clause::Order,
            "limit" => Clause::Limit,
            "set" => Clause::Set,
            "set_fields" => Clause::SetFields,
            "set_values" => Clause::SetValues,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
}

impl JoinKind {
    fn as_sql(self) -> &'static str {
        match self {
            JoinKind::Inner => "inner",
            JoinKind::Left => "left",
            JoinKind::Right => "right",
        }
    }
}

/// Join predicate
#[derive(Debug, Clone, PartialEq)]
pub enum JoinOn {
    /// `left = right`, both soft-quoted identifiers
    Columns(String, String),
    Expression(Expression),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub kind: JoinKind,
    pub table: String,
    pub alias: Option<String>,
    pub on: JoinOn,
}

#[derive(Debug, Clone, PartialEq)]
struct Aliased {
    alias: Option<String>,
    source: ArgumentValue,
}

impl Aliased {
    /// Key used for the uniqueness check: the alias, else a plain name
    fn key(&self) -> Option<&str> {
        self.alias.as_deref().or_else(|| self.source_name())
    }

    fn source_name(&self) -> Option<&str> {
        match &self.source {
            ArgumentValue::Literal(Value::String(name)) => Some(name),
            _ => None,
        }
    }
}

/// A composable SQL statement
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Statement {
    dialect: Dialect,
    mode: Option<Mode>,
    options: Vec<String>,
    fields: Vec<Aliased>,
    tables: Vec<Aliased>,
    joins: Vec<Join>,
    wheres: Vec<WhereEntry>,
    group: Vec<ArgumentValue>,
    having: Vec<WhereEntry>,
    order: Vec<(ArgumentValue, SortDirection)>,
    limit: Option<(u64, u64)>,
    set: Vec<(String, ArgumentValue)>,
}

impl Statement {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            ..Self::default()
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Current mode; an unset mode renders as `Select`
    pub fn mode(&self) -> Mode {
        self.mode.unwrap_or(Mode::Select)
    }

    /// Fix the mode. Switching to a different mode once set is an error.
    pub fn set_mode(&mut self, mode: Mode) -> Result<&mut Self> {
        match self.mode {
            Some(current) if current != mode => Err(CoreError::ModeAlreadySet {
                current,
                requested: mode,
            }),
            _ => {
                self.mode = Some(mode);
                Ok(self)
            }
        }
    }

    /// Statement keyword such as `distinct` or `ignore`
    pub fn option(&mut self, option: &str) -> &mut Self {
        self.options.push(option.to_string());
        self
    }

    pub fn table(&mut self, name: &str) -> Result<&mut Self> {
        self.push_table(None, ArgumentValue::from(name))
    }

    pub fn table_as(&mut self, name: &str, alias: &str) -> Result<&mut Self> {
        self.push_table(Some(alias), ArgumentValue::from(name))
    }

    /// Sub-query or expression as a table source
    pub fn table_expr(&mut self, source: impl Into<ArgumentValue>, alias: &str) -> Result<&mut Self> {
        self.push_table(Some(alias), source.into())
    }

    pub fn field(&mut self, name: &str) -> Result<&mut Self> {
        self.push_field(None, ArgumentValue::from(name))
    }

    pub fn field_as(&mut self, name: &str, alias: &str) -> Result<&mut Self> {
        self.push_field(Some(alias), ArgumentValue::from(name))
    }

    pub fn field_expr(&mut self, source: impl Into<ArgumentValue>, alias: Option<&str>) -> Result<&mut Self> {
        self.push_field(alias, source.into())
    }

    pub fn join(&mut self, kind: JoinKind, table: &str, alias: Option<&str>, on: JoinOn) -> &mut Self {
        self.joins.push(Join {
            kind,
            table: table.to_string(),
            alias: alias.map(str::to_string),
            on,
        });
        self
    }

    pub fn add_where(&mut self, entry: WhereEntry) -> &mut Self {
        self.wheres.push(entry);
        self
    }

    /// `field op value`; `None` selects the two-argument form
    pub fn where_cond(
        &mut self,
        field: impl Into<ArgumentValue>,
        operator: Option<Operator>,
        value: impl Into<ArgumentValue>,
    ) -> &mut Self {
        self.add_where(WhereEntry::condition(field, operator, value))
    }

    pub fn where_expr(&mut self, expr: impl Into<ArgumentValue>) -> &mut Self {
        self.add_where(WhereEntry::expression(expr))
    }

    pub fn where_group(&mut self, junction: Junction, entries: Vec<WhereEntry>) -> &mut Self {
        self.add_where(WhereEntry::group(junction, entries))
    }

    pub fn add_having(&mut self, entry: WhereEntry) -> &mut Self {
        self.having.push(entry);
        self
    }

    pub fn having_cond(
        &mut self,
        field: impl Into<ArgumentValue>,
        operator: Option<Operator>,
        value: impl Into<ArgumentValue>,
    ) -> &mut Self {
        self.add_having(WhereEntry::condition(field, operator, value))
    }

    pub fn group(&mut self, field: impl Into<ArgumentValue>) -> &mut Self {
        self.group.push(field.into());
        self
    }

    pub fn order(&mut self, field: impl Into<ArgumentValue>, direction: SortDirection) -> &mut Self {
        self.order.push((field.into(), direction));
        self
    }

    /// Return at most `count` rows after skipping `skip`
    pub fn limit(&mut self, count: u64, skip: u64) -> &mut Self {
        self.limit = Some((count, skip));
        self
    }

    pub fn set(&mut self, field: &str, value: impl Into<ArgumentValue>) -> &mut Self {
        self.set.push((field.to_string(), value.into()));
        self
    }

    pub fn wheres(&self) -> &[WhereEntry] {
        &self.wheres
    }

    pub fn havings(&self) -> &[WhereEntry] {
        &self.having
    }

    /// Render in this statement's dialect
    pub fn render(&self) -> Result<Rendered> {
        let mut session = RenderSession::new(self.dialect);
        let sql = self.render_into(&mut session)?;
        log::debug!("Rendered {} statement: {}", self.mode(), sql);
        Ok(session.finish(sql))
    }

    /// Render with parameters inlined, for human inspection only
    pub fn render_debug(&self) -> Result<String> {
        let mut session = RenderSession::debug(self.dialect);
        self.render_into(&mut session)
    }

    /// Render inside an existing session; nested statements follow the
    /// dialect of the outermost render
    pub fn render_into(&self, session: &mut RenderSession) -> Result<String> {
        let template = mode_template(self.mode()).resolve(session.dialect());
        render_template(template, &Arguments::new(), Some(self), session)
    }

    fn push_table(&mut self, alias: Option<&str>, source: ArgumentValue) -> Result<&mut Self> {
        let entry = Aliased {
            alias: alias.map(str::to_string),
            source,
        };
        check_unique("table", &self.tables, &entry)?;
        self.tables.push(entry);
        Ok(self)
    }

    fn push_field(&mut self, alias: Option<&str>, source: ArgumentValue) -> Result<&mut Self> {
        let entry = Aliased {
            alias: alias.map(str::to_string),
            source,
        };
        check_unique("field", &self.fields, &entry)?;
        self.fields.push(entry);
        Ok(self)
    }

    fn render_clause(&self, clause: Clause, dialect: Dialect) -> Result<Expression> {
        match clause {
            Clause::Option => Ok(if self.options.is_empty() {
                empty()
            } else {
                Expression::new(format!(" {}", self.options.join(" ")))
            }),
            Clause::Field => {
                if self.fields.is_empty() {
                    return Ok(Expression::new("*"));
                }
                let items = self.fields.iter().map(|f| aliased_item(f, " as ")).collect();
                Ok(list_clause("", items))
            }
            Clause::From => {
                if self.tables.is_empty() {
                    return Ok(empty());
                }
                let items = self.tables.iter().map(|t| aliased_item(t, " ")).collect();
                Ok(list_clause(" from ", items))
            }
            Clause::TableNoAlias => {
                let table = self
                    .tables
                    .first()
                    .ok_or(CoreError::MissingTable(self.mode()))?;
                Ok(Expression::with_args("{{}}", vec![table.source.clone()]))
            }
            Clause::Join => {
                let items = self.joins.iter().map(join_item).collect::<Vec<_>>();
                if items.is_empty() {
                    return Ok(empty());
                }
                let (templates, args): (Vec<String>, Vec<Vec<ArgumentValue>>) = items.into_iter().unzip();
                Ok(Expression::with_args(templates.concat(), args.concat()))
            }
            Clause::Where => predicate_clause(" where ", &self.wheres, dialect),
            Clause::Having => predicate_clause(" having ", &self.having, dialect),
            Clause::Group => {
                if self.group.is_empty() {
                    return Ok(empty());
                }
                let items = self
                    .group
                    .iter()
                    .map(|g| ("{{}}".to_string(), vec![g.clone()]))
                    .collect();
                Ok(list_clause(" group by ", items))
            }
            Clause::Order => {
                if self.order.is_empty() {
                    // OFFSET .. FETCH is only valid after an ORDER BY
                    if dialect == Dialect::Mssql && self.limit.is_some() {
                        return Ok(Expression::new(" order by (select null)"));
                    }
                    return Ok(empty());
                }
                let items = self
                    .order
                    .iter()
                    .map(|(field, direction)| {
                        let template = match direction {
                            SortDirection::Asc => "{{}}",
                            SortDirection::Desc => "{{}} desc",
                        };
                        (template.to_string(), vec![field.clone()])
                    })
                    .collect();
                Ok(list_clause(" order by ", items))
            }
            Clause::Limit => Ok(match self.limit {
                None => empty(),
                Some((count, skip)) => Expression::new(LIMIT.resolve(dialect))
                    .named("count", Value::from(count))
                    .named("skip", Value::from(skip)),
            }),
            Clause::Set => {
                self.require_set()?;
                let items = self
                    .set
                    .iter()
                    .map(|(field, value)| {
                        ("{{}} = []".to_string(), vec![ArgumentValue::from(field.as_str()), value.clone()])
                    })
                    .collect();
                Ok(list_clause("", items))
            }
            Clause::SetFields => {
                self.require_set()?;
                let items = self
                    .set
                    .iter()
                    .map(|(field, _)| ("{{}}".to_string(), vec![ArgumentValue::from(field.as_str())]))
                    .collect();
                Ok(list_clause("", items))
            }
            Clause::SetValues => {
                self.require_set()?;
                let items = self
                    .set
                    .iter()
                    .map(|(_, value)| ("[]".to_string(), vec![value.clone()]))
                    .collect();
                Ok(list_clause("", items))
            }
        }
    }

    fn require_set(&self) -> Result<()> {
        if self.set.is_empty() {
            return Err(CoreError::InvalidValue(format!(
                "{} statement requires at least one set field",
                self.mode()
            )));
        }
        Ok(())
    }
}

impl TagSource for Statement {
    fn resolve_tag(&self, tag: &str, dialect: Dialect) -> Result<Option<ArgumentValue>> {
        match Clause::from_tag(tag) {
            Some(clause) => Ok(Some(ArgumentValue::Expression(self.render_clause(clause, dialect)?))),
            None => Ok(None),
        }
    }
}

fn check_unique(kind: &'static str, existing: &[Aliased], entry: &Aliased) -> Result<()> {
    if let Some(key) = entry.key() {
        if existing.iter().any(|e| e.key() == Some(key)) {
            return Err(CoreError::AliasNotUnique {
                kind,
                alias: key.to_string(),
            });
        }
    }
    Ok(())
}

fn empty() -> Expression {
    Expression::new("")
}

fn aliased_item(item: &Aliased, alias_separator: &str) -> (String, Vec<ArgumentValue>) {
    match &item.alias {
        Some(alias) if item.source_name() != Some(alias.as_str()) => (
            format!("{{{{}}}}{}{{}}", alias_separator),
            vec![item.source.clone(), ArgumentValue::from(alias.as_str())],
        ),
        _ => ("{{}}".to_string(), vec![item.source.clone()]),
    }
}

fn join_item(join: &Join) -> (String, Vec<ArgumentValue>) {
    let mut template = format!(" {} join {{{{}}}}", join.kind.as_sql());
    let mut args = vec![ArgumentValue::from(join.table.as_str())];
    if let Some(alias) = &join.alias {
        template.push_str(" {}");
        args.push(ArgumentValue::from(alias.as_str()));
    }
    match &join.on {
        JoinOn::Columns(left, right) => {
            template.push_str(" on {{}} = {{}}");
            args.push(ArgumentValue::from(left.as_str()));
            args.push(ArgumentValue::from(right.as_str()));
        }
        JoinOn::Expression(expr) => {
            template.push_str(" on []");
            args.push(ArgumentValue::Expression(expr.clone()));
        }
    }
    (template, args)
}

/// `prefix` followed by the items joined with `, `
fn list_clause(prefix: &str, items: Vec<(String, Vec<ArgumentValue>)>) -> Expression {
    let (templates, args): (Vec<String>, Vec<Vec<ArgumentValue>>) = items.into_iter().unzip();
    Expression::with_args(format!("{}{}", prefix, templates.join(", ")), args.concat())
}

fn predicate_clause(prefix: &str, entries: &[WhereEntry], dialect: Dialect) -> Result<Expression> {
    let mut parts = Vec::with_capacity(entries.len());
    for entry in entries {
        if let Some(expr) = entry.to_expression(dialect)? {
            parts.push(ArgumentValue::Expression(expr));
        }
    }
    if parts.is_empty() {
        return Ok(empty());
    }
    let template = format!("{}{}", prefix, vec!["[]"; parts.len()].join(" and "));
    Ok(Expression::with_args(template, parts))
}
