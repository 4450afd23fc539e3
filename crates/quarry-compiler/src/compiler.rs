//! Scope to SQL compiler
//!
//! Walks a scope tree and fills the WHERE (or HAVING) accumulator of a
//! [`Statement`]. Field values go through the codec of their entity, and
//! relationship paths become correlated `exists` or `count(*)` sub-queries.

use crate::codec::{CodecSource, PassthroughCodecs};
use crate::error::{CompileError, Result};
use crate::options::CompilerOptions;
use crate::relationship::{Entity, RelatedSet, Relationships};
use quarry_core::scope::COUNT_SEGMENT;
use quarry_core::{
    ArgumentValue, Condition, ConditionValue, CoreError, Expression, FieldRef, Junction, Operator,
    Rendered, RootScope, Scope, ScopeNode, Statement, Value, WhereEntry,
};
use std::sync::Arc;

/// Compiles scopes into statement predicates
#[derive(Clone)]
pub struct SqlCompiler {
    options: CompilerOptions,
    codecs: Arc<dyn CodecSource>,
    relationships: Option<Arc<dyn Relationships>>,
}

impl Default for SqlCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlCompiler {
    /// Create a compiler with default options and passthrough codecs
    pub fn new() -> Self {
        Self::with_options(CompilerOptions::default())
    }

    pub fn with_options(options: CompilerOptions) -> Self {
        Self {
            options,
            codecs: Arc::new(PassthroughCodecs),
            relationships: None,
        }
    }

    pub fn with_codecs(mut self, codecs: impl CodecSource + 'static) -> Self {
        self.codecs = Arc::new(codecs);
        self
    }

    pub fn with_relationships(mut self, relationships: impl Relationships + 'static) -> Self {
        self.relationships = Some(Arc::new(relationships));
        self
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    pub fn codecs(&self) -> &dyn CodecSource {
        self.codecs.as_ref()
    }

    /// Select statement over the root scope's context
    pub fn compile_select(&self, root: &RootScope) -> Result<Statement> {
        let mut statement = Statement::new(self.options.dialect);
        statement.table(root.context())?;
        self.fill_where(&mut statement, root)?;
        Ok(statement)
    }

    /// Compile and render in one step
    pub fn compile(&self, root: &RootScope) -> Result<Rendered> {
        let rendered = self.compile_select(root)?.render()?;
        if self.options.log_sql {
            tracing::info!(sql = %rendered.sql, params = rendered.params.len(), "Compiled scope");
        } else {
            tracing::debug!(sql = %rendered.sql, params = rendered.params.len(), "Compiled scope");
        }
        Ok(rendered)
    }

    /// Add the root scope's predicates to the WHERE clause
    pub fn fill_where(&self, statement: &mut Statement, root: &RootScope) -> Result<()> {
        let entity = Entity::root(root.context());
        let entries = self
            .scope_entries(&entity, root.scope())
            .map_err(|e| in_statement(statement, e))?;
        for entry in entries {
            statement.add_where(entry);
        }
        Ok(())
    }

    /// Add the root scope's predicates to the HAVING clause
    pub fn fill_having(&self, statement: &mut Statement, root: &RootScope) -> Result<()> {
        let entity = Entity::root(root.context());
        let entries = self
            .scope_entries(&entity, root.scope())
            .map_err(|e| in_statement(statement, e))?;
        for entry in entries {
            statement.add_having(entry);
        }
        Ok(())
    }

    pub(crate) fn fill_where_for(&self, statement: &mut Statement, entity: &Entity, scope: &Scope) -> Result<()> {
        for entry in self.scope_entries(entity, scope)? {
            statement.add_where(entry);
        }
        Ok(())
    }

    /// Top-level AND children become separate entries; anything else is
    /// a single entry
    fn scope_entries(&self, entity: &Entity, scope: &Scope) -> Result<Vec<WhereEntry>> {
        let mut entries = Vec::new();
        match ScopeNode::Scope(scope.clone()).simplify() {
            ScopeNode::Scope(scope) if scope.junction() == Junction::And => {
                for child in scope.children() {
                    entries.extend(self.compile_node(entity, child)?);
                }
            }
            node => entries.extend(self.compile_node(entity, &node)?),
        }
        Ok(entries)
    }

    /// Compile one node; `None` when it imposes no constraint
    pub fn compile_node(&self, entity: &Entity, node: &ScopeNode) -> Result<Option<WhereEntry>> {
        match node.simplified() {
            ScopeNode::Condition(condition) => self.to_query_arguments(entity, &condition),
            ScopeNode::Scope(scope) => {
                let mut entries = Vec::with_capacity(scope.children().len());
                for child in scope.children() {
                    entries.extend(self.compile_node(entity, child)?);
                }
                if entries.is_empty() {
                    return Ok(None);
                }
                Ok(Some(WhereEntry::group(scope.junction(), entries)))
            }
        }
    }

    /// Compile a leaf into a WHERE entry
    pub fn to_query_arguments(&self, entity: &Entity, condition: &Condition) -> Result<Option<WhereEntry>> {
        let Some(condition) = condition.resolved()? else {
            return Ok(None);
        };
        tracing::debug!(entity = entity.name(), condition = %condition.describe(), "Compiling condition");

        let field = condition.field().ok_or_else(|| {
            CoreError::InvalidValue(format!("condition has no field: {}", condition.describe()))
        })?;

        if let Some((hop, rest)) = field.split_hop() {
            return self.navigate(entity, &condition, hop, rest).map(Some);
        }

        match field {
            FieldRef::Expression(expr) => match (condition.operator(), condition.value()) {
                (None, None) => Ok(Some(WhereEntry::expression(expr.clone()))),
                (operator, value) => {
                    let value = value.map(ConditionValue::to_argument).transpose()?;
                    Ok(Some(comparison(
                        ArgumentValue::Expression(expr.clone()),
                        operator,
                        value.unwrap_or(ArgumentValue::Literal(Value::Null)),
                    )))
                }
            },
            FieldRef::Path(path) => {
                let codec = self.codecs.codec(entity.name(), path)?;
                let args = codec.query_arguments(condition.operator(), condition.value())?;
                let field = qualify(entity, args.field);
                Ok(Some(match args.value {
                    None => WhereEntry::expression(Expression::with_args("{{}}", vec![field])),
                    Some(value) => comparison(field, args.operator, value),
                }))
            }
        }
    }

    fn navigate(&self, entity: &Entity, condition: &Condition, hop: &str, rest: &str) -> Result<WhereEntry> {
        let relationships = self
            .relationships
            .as_ref()
            .ok_or_else(|| CompileError::UnknownRelationship {
                entity: entity.name().to_string(),
                hop: hop.to_string(),
            })?;
        let mut related = relationships.resolve(entity, hop)?;

        if rest == COUNT_SEGMENT {
            return self.count_check(&related, condition);
        }

        related.add_condition(condition.with_field(rest));
        Ok(WhereEntry::expression(related.exists_fragment(self)?))
    }

    fn count_check(&self, related: &RelatedSet, condition: &Condition) -> Result<WhereEntry> {
        let Some(operator) = condition.operator() else {
            return Ok(WhereEntry::expression(related.exists_fragment(self)?));
        };
        match existence_shortcut(operator, condition.value()) {
            Some(true) => Ok(WhereEntry::expression(related.exists_fragment(self)?)),
            Some(false) => Ok(WhereEntry::expression(
                Expression::new("not []").arg(related.exists_fragment(self)?),
            )),
            None => {
                let value = match condition.value() {
                    Some(value) => value.to_argument()?,
                    None => ArgumentValue::Literal(Value::Null),
                };
                Ok(comparison(
                    ArgumentValue::Expression(related.count_fragment(self)?),
                    Some(operator),
                    value,
                ))
            }
        }
    }
}

/// Count comparisons that reduce to (not) exists
fn existence_shortcut(operator: Operator, value: Option<&ConditionValue>) -> Option<bool> {
    let Some(ConditionValue::Scalar(Value::Number(n))) = value else {
        return None;
    };
    match (operator, *n) {
        (Operator::Eq, n) | (Operator::Lte, n) if n == 0.0 => Some(false),
        (Operator::Lt, n) if n == 1.0 => Some(false),
        (Operator::Gt, n) | (Operator::Neq, n) if n == 0.0 => Some(true),
        (Operator::Gte, n) if n == 1.0 => Some(true),
        _ => None,
    }
}

/// `Eq` collapses to the two-argument form
fn comparison(field: ArgumentValue, operator: Option<Operator>, value: ArgumentValue) -> WhereEntry {
    let operator = match operator {
        None | Some(Operator::Eq) => None,
        other => other,
    };
    WhereEntry::condition(field, operator, value)
}

fn qualify(entity: &Entity, field: ArgumentValue) -> ArgumentValue {
    match (&field, entity.alias()) {
        (ArgumentValue::Literal(Value::String(column)), Some(_)) => ArgumentValue::from(entity.qualify(column)),
        _ => field,
    }
}

fn in_statement(statement: &Statement, error: CompileError) -> CompileError {
    CompileError::InStatement {
        statement: statement
            .render_debug()
            .unwrap_or_else(|_| format!("<{} statement>", statement.mode())),
        source: Box::new(error),
    }
}
