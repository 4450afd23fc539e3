//! Relationship boundary used by path navigation
//!
//! A condition on `orders/total` is compiled against the entity set reached
//! through the `orders` hop: the remaining condition is pushed onto a
//! [`RelatedSet`], which renders as a correlated sub-query.

use crate::compiler::SqlCompiler;
use crate::error::{CompileError, Result};
use quarry_core::{Dialect, Expression, RootScope, ScopeNode, Statement};
use std::collections::HashMap;

/// An entity set taking part in a compiled query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    name: String,
    alias: Option<String>,
    depth: usize,
}

impl Entity {
    /// The queried entity itself, referenced by its table name
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            depth: 0,
        }
    }

    pub fn related(name: impl Into<String>, alias: impl Into<String>, depth: usize) -> Self {
        Self {
            name: name.into(),
            alias: Some(alias.into()),
            depth,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// Number of hops from the root entity
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Name used to reference this set's columns
    pub fn reference(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    pub fn qualify(&self, column: &str) -> String {
        format!("{}.{}", self.reference(), column)
    }
}

/// Resolves relationship hops
pub trait Relationships: Send + Sync {
    fn resolve(&self, entity: &Entity, hop: &str) -> Result<RelatedSet>;
}

/// The related side of one hop: a correlated statement plus the conditions
/// pushed onto it
#[derive(Debug, Clone)]
pub struct RelatedSet {
    entity: Entity,
    statement: Statement,
    scope: RootScope,
}

impl RelatedSet {
    /// `statement` must select from the related table under the entity's
    /// alias and already hold the correlation predicate
    pub fn new(entity: Entity, statement: Statement) -> Self {
        let scope = RootScope::new(entity.name());
        Self {
            entity,
            statement,
            scope,
        }
    }

    pub fn entity(&self) -> &Entity {
        &self.entity
    }

    pub fn scope(&self) -> &RootScope {
        &self.scope
    }

    pub fn add_condition(&mut self, node: impl Into<ScopeNode>) -> &mut Self {
        self.scope.add(node);
        self
    }

    /// `exists (select 1 from ... where ...)`
    pub fn exists_fragment(&self, compiler: &SqlCompiler) -> Result<Expression> {
        let mut statement = self.filled(compiler)?;
        statement.field_expr(Expression::new("1"), None)?;
        Ok(Expression::new("exists []").arg(statement))
    }

    /// `(select count(*) from ... where ...)`
    pub fn count_fragment(&self, compiler: &SqlCompiler) -> Result<Expression> {
        let mut statement = self.filled(compiler)?;
        statement.field_expr(Expression::new("count(*)"), None)?;
        Ok(Expression::new("[]").arg(statement))
    }

    fn filled(&self, compiler: &SqlCompiler) -> Result<Statement> {
        let mut statement = self.statement.clone();
        compiler.fill_where_for(&mut statement, &self.entity, self.scope.scope())?;
        Ok(statement)
    }
}

/// Join columns of one relationship
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub table: String,
    /// Column on the related table
    pub related_column: String,
    /// Column on the parent table
    pub parent_column: String,
}

/// Relationships declared as foreign-key links
#[derive(Debug, Clone, Default)]
pub struct ForeignKeys {
    links: HashMap<(String, String), Link>,
}

impl ForeignKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// `entity` has many `table` rows whose `foreign_key` holds the
    /// parent's `local_key`
    pub fn has_many(
        mut self,
        entity: &str,
        hop: &str,
        table: &str,
        foreign_key: &str,
        local_key: &str,
    ) -> Self {
        self.insert(entity, hop, table, foreign_key, local_key);
        self
    }

    /// `entity` refers to one `table` row through its own `our_field`
    pub fn has_one(mut self, entity: &str, hop: &str, table: &str, their_key: &str, our_field: &str) -> Self {
        self.insert(entity, hop, table, their_key, our_field);
        self
    }

    pub fn link(&self, entity: &str, hop: &str) -> Option<&Link> {
        self.links.get(&(entity.to_string(), hop.to_string()))
    }

    fn insert(&mut self, entity: &str, hop: &str, table: &str, related_column: &str, parent_column: &str) {
        self.links.insert(
            (entity.to_string(), hop.to_string()),
            Link {
                table: table.to_string(),
                related_column: related_column.to_string(),
                parent_column: parent_column.to_string(),
            },
        );
    }
}

impl Relationships for ForeignKeys {
    fn resolve(&self, entity: &Entity, hop: &str) -> Result<RelatedSet> {
        let link = self
            .link(entity.name(), hop)
            .ok_or_else(|| CompileError::UnknownRelationship {
                entity: entity.name().to_string(),
                hop: hop.to_string(),
            })?;

        let depth = entity.depth() + 1;
        let initial = hop.chars().next().unwrap_or('r');
        let related = Entity::related(&link.table, format!("_{}{}", initial, depth), depth);

        let mut statement = Statement::new(Dialect::default());
        statement.table_as(&link.table, related.reference())?;
        statement.where_expr(
            Expression::new("{{}} = {{}}")
                .arg(related.qualify(&link.related_column))
                .arg(entity.qualify(&link.parent_column)),
        );

        tracing::debug!(
            entity = entity.name(),
            hop,
            table = %link.table,
            alias = related.reference(),
            "Resolved relationship"
        );
        Ok(RelatedSet::new(related, statement))
    }
}
