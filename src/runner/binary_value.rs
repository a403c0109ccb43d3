//! Native copies of managed values.
//!
//! A [`BinaryValue`] is what the host gets to hold. Primitives and arrays are
//! copied out of the managed environment. Functions and plain objects cannot be
//! copied, so they are pinned in their context and the host receives a
//! [`PersistentHandle`] naming them instead.

use serde::Deserialize;
use uuid::Uuid;

use num_bigint::BigInt;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::execution_context::JsContext;
use crate::runner::ds::object::ObjectType;
use crate::runner::ds::value::{JsNumberType, JsValue};

pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Names a value pinned in one particular context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PersistentHandle {
    context_id: Uuid,
    id: u64,
}

impl PersistentHandle {
    pub fn context_id(&self) -> Uuid {
        self.context_id
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BinaryValue {
    Undefined,
    Null,
    Bool(bool),
    Integer(i64),
    Double(f64),
    String(String),
    BigInt(BigInt),
    Array(Vec<BinaryValue>),
    Function(PersistentHandle),
    Object(PersistentHandle),
}

impl BinaryValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            BinaryValue::Undefined => "undefined",
            BinaryValue::Null => "null",
            BinaryValue::Bool(_) => "boolean",
            BinaryValue::Integer(_) | BinaryValue::Double(_) => "number",
            BinaryValue::String(_) => "string",
            BinaryValue::BigInt(_) => "bigint",
            BinaryValue::Array(_) => "array",
            BinaryValue::Function(_) => "function",
            BinaryValue::Object(_) => "object",
        }
    }

    pub fn as_handle(&self) -> Option<PersistentHandle> {
        match self {
            BinaryValue::Function(h) | BinaryValue::Object(h) => Some(*h),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// How many levels of nested arrays are copied before giving up.
    pub max_depth: usize,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        ConversionConfig {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Converts between managed values and [`BinaryValue`]s.
///
/// Holds no managed state itself, so one factory can be shared (`Arc`) with
/// callers living on any thread; the context to convert against is always
/// passed in.
#[derive(Debug)]
pub struct BinaryValueFactory {
    max_depth: usize,
}

impl BinaryValueFactory {
    pub fn new(config: &ConversionConfig) -> Self {
        BinaryValueFactory {
            max_depth: config.max_depth,
        }
    }

    pub fn new_value(&self, context: &JsContext, value: &JsValue) -> Result<BinaryValue, JErrorType> {
        self.convert(context, value, 0)
    }

    fn convert(
        &self,
        context: &JsContext,
        value: &JsValue,
        depth: usize,
    ) -> Result<BinaryValue, JErrorType> {
        Ok(match value {
            JsValue::Undefined => BinaryValue::Undefined,
            JsValue::Null => BinaryValue::Null,
            JsValue::Boolean(b) => BinaryValue::Bool(*b),
            JsValue::String(s) => BinaryValue::String(s.to_string()),
            JsValue::Number(n) => match n {
                JsNumberType::Integer(i) => BinaryValue::Integer(*i),
                JsNumberType::Float(f) => BinaryValue::Double(*f),
                JsNumberType::NaN => BinaryValue::Double(f64::NAN),
                JsNumberType::PositiveInfinity => BinaryValue::Double(f64::INFINITY),
                JsNumberType::NegativeInfinity => BinaryValue::Double(f64::NEG_INFINITY),
            },
            JsValue::BigInt(b) => BinaryValue::BigInt(b.clone()),
            JsValue::Object(o) => {
                let elements = match &*o.borrow() {
                    ObjectType::Array(a) => Some(a.elements().to_vec()),
                    _ => None,
                };
                match elements {
                    Some(elements) => self.convert_elements(context, &elements, depth)?,
                    None => {
                        let handle = self.persist(context, value.clone());
                        if value.is_function() {
                            BinaryValue::Function(handle)
                        } else {
                            BinaryValue::Object(handle)
                        }
                    }
                }
            }
        })
    }

    fn convert_elements(
        &self,
        context: &JsContext,
        elements: &[JsValue],
        depth: usize,
    ) -> Result<BinaryValue, JErrorType> {
        if depth >= self.max_depth {
            return Err(JErrorType::RangeError(format!(
                "Maximum conversion depth of {} exceeded",
                self.max_depth
            )));
        }
        let mut converted = Vec::with_capacity(elements.len());
        for element in elements {
            match self.convert(context, element, depth + 1) {
                Ok(v) => converted.push(v),
                Err(e) => {
                    // Handles pinned for earlier elements would otherwise leak.
                    for v in &converted {
                        self.free_value(context, v);
                    }
                    return Err(e);
                }
            }
        }
        Ok(BinaryValue::Array(converted))
    }

    fn persist(&self, context: &JsContext, value: JsValue) -> PersistentHandle {
        PersistentHandle {
            context_id: context.id(),
            id: context.persist(value),
        }
    }

    /// Turn a host value back into a managed one inside `context`.
    pub fn to_js_value(&self, context: &JsContext, value: &BinaryValue) -> Result<JsValue, JErrorType> {
        Ok(match value {
            BinaryValue::Undefined => JsValue::Undefined,
            BinaryValue::Null => JsValue::Null,
            BinaryValue::Bool(b) => JsValue::Boolean(*b),
            BinaryValue::Integer(i) => JsValue::Number(JsNumberType::Integer(*i)),
            BinaryValue::Double(f) => JsValue::Number(if f.is_nan() {
                JsNumberType::NaN
            } else if *f == f64::INFINITY {
                JsNumberType::PositiveInfinity
            } else if *f == f64::NEG_INFINITY {
                JsNumberType::NegativeInfinity
            } else {
                JsNumberType::Float(*f)
            }),
            BinaryValue::String(s) => JsValue::String(s.to_string()),
            BinaryValue::BigInt(b) => JsValue::BigInt(b.clone()),
            BinaryValue::Array(elements) => {
                let values = elements
                    .iter()
                    .map(|e| self.to_js_value(context, e))
                    .collect::<Result<Vec<JsValue>, JErrorType>>()?;
                context.new_array(values)?
            }
            BinaryValue::Function(h) | BinaryValue::Object(h) => self.resolve(context, h)?,
        })
    }

    fn resolve(&self, context: &JsContext, handle: &PersistentHandle) -> Result<JsValue, JErrorType> {
        if handle.context_id != context.id() {
            return Err(JErrorType::ReferenceError(format!(
                "handle {} belongs to another context",
                handle.id
            )));
        }
        context.get_persistent(handle.id).ok_or_else(|| {
            JErrorType::ReferenceError(format!("handle {} has been released", handle.id))
        })
    }

    /// Release every handle reachable from `value` that was pinned in `context`.
    pub fn free_value(&self, context: &JsContext, value: &BinaryValue) {
        match value {
            BinaryValue::Array(elements) => {
                for e in elements {
                    self.free_value(context, e);
                }
            }
            BinaryValue::Function(h) | BinaryValue::Object(h) => {
                if h.context_id == context.id() {
                    context.release_persistent(h.id);
                }
            }
            _ => {}
        }
    }
}

impl Default for BinaryValueFactory {
    fn default() -> Self {
        Self::new(&ConversionConfig::default())
    }
}
