//! The guest's numeric coercion convention: a binary operator handed an
//! operand the receiver does not understand asks the operand (not the
//! receiver) to `coerce` both values into a compatible pair, then retries
//! the operator on that pair.

use std::sync::Arc;

use crate::value::{RuntimeError, Value};

use super::dispatch::CallSignature;
use super::protocols::Protocols;
use super::protocols_cmp::is_true;
use super::Context;

impl Protocols {
    /// Coerce and retry `op`, or decline. Declines when `other` is nil,
    /// when `other` has no `coerce` method, when `coerce` raises a
    /// recoverable fault, or when it returns anything but a two-element
    /// array. Faults outside the recoverable category propagate, as do
    /// faults raised by the retried operator itself.
    fn try_coerce(
        &self,
        ctx: &Context,
        op: &str,
        this: &Value,
        other: &Value,
    ) -> Result<Option<Value>, RuntimeError> {
        if matches!(other, Value::Nil) {
            return Ok(None);
        }

        // The coercion method belongs to the operand: receiver and
        // argument swap places. The coerce site suppresses the
        // method_missing hook, so an undefined coerce is a clean
        // no-method fault rather than a secondary dispatch.
        let pair = match self
            .coerce_site
            .invoke(ctx, other, std::slice::from_ref(this))
        {
            Ok(result) => result,
            Err(e) if e.is_recoverable() => return Ok(None),
            Err(e) => return Err(e),
        };

        let items: Arc<Vec<Value>> = match pair {
            Value::Array(items) if items.len() == 2 => items,
            _ => return Ok(None),
        };

        let op_site = self.sites.acquire(op, CallSignature::new(1));
        let result = op_site.invoke(ctx, &items[0], std::slice::from_ref(&items[1]))?;
        Ok(Some(result))
    }

    /// Coerce and invoke `<=>`: the raw result, or nil when the coercion
    /// declined. Never faults on decline.
    pub fn coerce_and_compare(
        &self,
        ctx: &Context,
        this: &Value,
        other: &Value,
    ) -> Result<Value, RuntimeError> {
        Ok(self
            .try_coerce(ctx, "<=>", this, other)?
            .unwrap_or(Value::Nil))
    }

    /// Coerce and invoke a relational operator, reducing the result to
    /// guest truth. A declined coercion is a comparison fault naming both
    /// original operands.
    pub fn coerce_and_relate(
        &self,
        ctx: &Context,
        relational_op: &str,
        this: &Value,
        other: &Value,
    ) -> Result<bool, RuntimeError> {
        match self.try_coerce(ctx, relational_op, this, other)? {
            Some(result) => Ok(is_true(&result)),
            None => Err(RuntimeError::comparison_failed(this, other)),
        }
    }

    /// Coerce and invoke an arithmetic operator, returning its raw
    /// result. A declined coercion is a coercion fault.
    pub fn coerce_and_apply(
        &self,
        ctx: &Context,
        binary_op: &str,
        this: &Value,
        other: &Value,
    ) -> Result<Value, RuntimeError> {
        match self.try_coerce(ctx, binary_op, this, other)? {
            Some(result) => Ok(result),
            None => Err(RuntimeError::coercion_failed(other, this)),
        }
    }

    /// Loose entry point: the operator result reduced to a guest boolean,
    /// or nil when the coercion declined or the operator answered nil.
    /// Never faults on decline.
    pub fn try_coerce_and_apply(
        &self,
        ctx: &Context,
        binary_op: &str,
        this: &Value,
        other: &Value,
    ) -> Result<Value, RuntimeError> {
        match self.try_coerce(ctx, binary_op, this, other)? {
            Some(Value::Nil) | None => Ok(Value::Nil),
            Some(result) => Ok(Value::Bool(is_true(&result))),
        }
    }
}
