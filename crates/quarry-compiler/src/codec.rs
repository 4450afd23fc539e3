//! Field codecs
//!
//! A codec maps a logical field to its storage key and encodes condition
//! values into storage form. Both backends consult the same codecs, so an
//! encoded value compiled into SQL is the value the matcher compares rows
//! against.

use crate::error::{CompileError, Result};
use quarry_core::{ArgumentValue, ConditionValue, Operator, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Renderable field, operator and encoded value of one condition
#[derive(Debug, Clone, PartialEq)]
pub struct QueryArguments {
    pub field: ArgumentValue,
    pub operator: Option<Operator>,
    pub value: Option<ArgumentValue>,
}

pub trait FieldCodec: Send + Sync {
    /// Storage key: column name in SQL, row key in the matcher
    fn key(&self) -> &str;

    /// Encode a single scalar
    fn encode(&self, value: &Value) -> Result<Value> {
        Ok(value.clone())
    }

    fn query_arguments(
        &self,
        operator: Option<Operator>,
        value: Option<&ConditionValue>,
    ) -> Result<QueryArguments> {
        let value = match value {
            None => None,
            Some(ConditionValue::Scalar(v)) => Some(ArgumentValue::Literal(self.encode(v)?)),
            Some(ConditionValue::List(items)) => {
                let encoded = items.iter().map(|v| self.encode(v)).collect::<Result<Vec<_>>>()?;
                Some(ArgumentValue::Literal(Value::Array(encoded)))
            }
            Some(other) => Some(other.to_argument()?),
        };
        Ok(QueryArguments {
            field: ArgumentValue::from(self.key()),
            operator,
            value,
        })
    }
}

/// Looks up the codec of an entity field
pub trait CodecSource: Send + Sync {
    fn codec(&self, entity: &str, field: &str) -> Result<Arc<dyn FieldCodec>>;
}

/// Field stored under its own name, values unchanged
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassthroughCodec {
    key: String,
}

impl PassthroughCodec {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl FieldCodec for PassthroughCodec {
    fn key(&self) -> &str {
        &self.key
    }
}

/// Every field is a [`PassthroughCodec`]
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughCodecs;

impl CodecSource for PassthroughCodecs {
    fn codec(&self, _entity: &str, field: &str) -> Result<Arc<dyn FieldCodec>> {
        Ok(Arc::new(PassthroughCodec::new(field)))
    }
}

type Encoder = Arc<dyn Fn(&Value) -> std::result::Result<Value, String> + Send + Sync>;

/// Field stored under another column name, optionally with a value encoder
#[derive(Clone)]
pub struct ColumnCodec {
    field: String,
    column: String,
    encoder: Option<Encoder>,
}

impl ColumnCodec {
    pub fn new(field: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            column: column.into(),
            encoder: None,
        }
    }

    /// Encoder applied to every scalar; `Err` carries the reason
    pub fn with_encoder(
        mut self,
        encoder: impl Fn(&Value) -> std::result::Result<Value, String> + Send + Sync + 'static,
    ) -> Self {
        self.encoder = Some(Arc::new(encoder));
        self
    }
}

impl fmt::Debug for ColumnCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnCodec")
            .field("field", &self.field)
            .field("column", &self.column)
            .field("encoder", &self.encoder.is_some())
            .finish()
    }
}

impl FieldCodec for ColumnCodec {
    fn key(&self) -> &str {
        &self.column
    }

    fn encode(&self, value: &Value) -> Result<Value> {
        match &self.encoder {
            // Null is never encoded so `is null` survives
            Some(encoder) if !value.is_null() => {
                encoder(value).map_err(|message| CompileError::Codec {
                    field: self.field.clone(),
                    operator: None,
                    value: value.to_string(),
                    message,
                })
            }
            _ => Ok(value.clone()),
        }
    }

    fn query_arguments(
        &self,
        operator: Option<Operator>,
        value: Option<&ConditionValue>,
    ) -> Result<QueryArguments> {
        let encoded = match value {
            Some(ConditionValue::Scalar(v)) => {
                let encoded = self.encode(v).map_err(|e| with_operator(e, operator))?;
                Some(ArgumentValue::Literal(encoded))
            }
            Some(ConditionValue::List(items)) => {
                let mut encoded = Vec::with_capacity(items.len());
                for item in items {
                    encoded.push(self.encode(item).map_err(|e| with_operator(e, operator))?);
                }
                Some(ArgumentValue::Literal(Value::Array(encoded)))
            }
            Some(other) => Some(other.to_argument()?),
            None => None,
        };
        Ok(QueryArguments {
            field: ArgumentValue::from(self.column.as_str()),
            operator,
            value: encoded,
        })
    }
}

fn with_operator(error: CompileError, op: Option<Operator>) -> CompileError {
    match error {
        CompileError::Codec {
            field,
            value,
            message,
            ..
        } => CompileError::Codec {
            field,
            operator: op,
            value,
            message,
        },
        other => other,
    }
}

/// Explicit per-entity registry.
///
/// Unregistered fields fall back to passthrough unless the map is strict.
#[derive(Clone, Default)]
pub struct CodecMap {
    codecs: HashMap<(String, String), Arc<dyn FieldCodec>>,
    strict: bool,
}

impl CodecMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject unregistered fields with [`CompileError::UnknownField`]
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    pub fn register(mut self, entity: &str, field: &str, codec: impl FieldCodec + 'static) -> Self {
        self.codecs
            .insert((entity.to_string(), field.to_string()), Arc::new(codec));
        self
    }

    /// Register a field that is stored as-is
    pub fn field(self, entity: &str, field: &str) -> Self {
        self.register(entity, field, PassthroughCodec::new(field))
    }
}

impl fmt::Debug for CodecMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.codecs.keys().collect();
        keys.sort();
        f.debug_struct("CodecMap")
            .field("fields", &keys)
            .field("strict", &self.strict)
            .finish()
    }
}

impl CodecSource for CodecMap {
    fn codec(&self, entity: &str, field: &str) -> Result<Arc<dyn FieldCodec>> {
        if let Some(codec) = self.codecs.get(&(entity.to_string(), field.to_string())) {
            return Ok(Arc::clone(codec));
        }
        if self.strict {
            return Err(CompileError::UnknownField {
                entity: entity.to_string(),
                field: field.to_string(),
            });
        }
        Ok(Arc::new(PassthroughCodec::new(field)))
    }
}
