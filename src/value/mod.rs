use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use num_bigint::BigInt;

use crate::symbol::Symbol;

mod error;
mod integer;
mod types;

pub use error::{FaultKind, RuntimeError};
pub use integer::IntegerValue;
pub use types::{ClassSpec, HostType};

static INSTANCE_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_instance_id() -> u64 {
    INSTANCE_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// A guest-language value. The guest exposes a single conceptual integer
/// type backed by two representations: `Int` whenever the value fits a
/// machine word, `BigInt` otherwise. Every construction point that can
/// produce an integer re-normalizes, so a value that fits `i64` is never
/// observed as `BigInt`.
#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    BigInt(BigInt),
    Num(f64),
    Str(String),
    Sym(Symbol),
    Array(Arc<Vec<Value>>),
    /// A guest class or module object. Classes carry the host type
    /// descriptor they are projected from; plain modules do not.
    Class(Arc<ClassSpec>),
    /// A tracker wrapping a host type descriptor directly.
    HostType(Arc<HostType>),
    Instance {
        class_name: String,
        id: u64,
    },
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::BigInt(a), Value::BigInt(b)) => a == b,
            (Value::BigInt(a), Value::Int(b)) | (Value::Int(b), Value::BigInt(a)) => {
                *a == BigInt::from(*b)
            }
            (Value::Num(a), Value::Num(b)) => a == b,
            (Value::Int(a), Value::Num(b)) | (Value::Num(b), Value::Int(a)) => (*a as f64) == *b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Sym(a), Value::Sym(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Class(a), Value::Class(b)) => Arc::ptr_eq(a, b) || a.name == b.name,
            (Value::HostType(a), Value::HostType(b)) => a == b,
            (Value::Instance { id: a, .. }, Value::Instance { id: b, .. }) => a == b,
            _ => false,
        }
    }
}

impl Value {
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Arc::new(items))
    }

    pub fn make_instance(class_name: impl Into<String>) -> Self {
        Value::Instance {
            class_name: class_name.into(),
            id: next_instance_id(),
        }
    }

    /// Guest truthiness: everything is true except `nil` and `false`.
    /// Zero, the empty string and the empty array are all truthy.
    pub fn truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    /// The guest class name, as used in fault messages.
    pub fn class_name(&self) -> &str {
        match self {
            Value::Nil => "NilClass",
            Value::Bool(true) => "TrueClass",
            Value::Bool(false) => "FalseClass",
            Value::Int(_) => "Fixnum",
            Value::BigInt(_) => "Bignum",
            Value::Num(_) => "Float",
            Value::Str(_) => "String",
            Value::Sym(_) => "Symbol",
            Value::Array(_) => "Array",
            Value::Class(spec) => {
                if spec.host_type.is_some() {
                    "Class"
                } else {
                    "Module"
                }
            }
            Value::HostType(_) => "Class",
            Value::Instance { class_name, .. } => class_name,
        }
    }

    /// Default display string, used when the `to_s` protocol has nothing
    /// better to offer. Matches the guest's built-in `to_s` output.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Nil => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::BigInt(n) => n.to_string(),
            Value::Num(f) => {
                if f.fract() == 0.0 && f.is_finite() {
                    format!("{:.1}", f)
                } else {
                    f.to_string()
                }
            }
            Value::Str(s) => s.clone(),
            Value::Sym(sym) => sym.name(),
            Value::Array(items) => items
                .iter()
                .map(|v| v.to_display_string())
                .collect::<Vec<_>>()
                .join(""),
            Value::Class(spec) => spec.name.clone(),
            Value::HostType(ht) => ht.name.clone(),
            Value::Instance { class_name, id } => format!("#<{}:0x{:x}>", class_name, id),
        }
    }

    /// Identity in the guest sense: same object, not merely equal value.
    /// Used as the fast path before dispatching `==`.
    pub(crate) fn is_identical(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Sym(a), Value::Sym(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Arc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => Arc::ptr_eq(a, b),
            (Value::HostType(a), Value::HostType(b)) => Arc::ptr_eq(a, b),
            (Value::Instance { id: a, .. }, Value::Instance { id: b, .. }) => a == b,
            _ => false,
        }
    }
}

// Compile-time assertion that Value is Send + Sync
const _: fn() = || {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Value>();
};
