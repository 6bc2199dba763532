use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::symbol::Symbol;
use crate::value::{RuntimeError, Value};

use super::protocols::Protocols;
use super::Context;

/// Guest truthiness: anything but `nil` and `false` is true.
pub fn is_true(value: &Value) -> bool {
    value.truthy()
}

/// Object id the guest reports for `nil`.
const NIL_OBJECT_ID: i64 = 4;

/// Reduce the result of a guest `hash` call to a host hash code. Fixnums
/// pass through; everything else hashes by identity or representation.
pub fn to_hash_code(hash_result: &Value) -> i64 {
    match hash_result {
        Value::Int(i) => *i,
        Value::BigInt(n) => {
            let mut hasher = DefaultHasher::new();
            n.hash(&mut hasher);
            hasher.finish() as i64
        }
        Value::Nil => NIL_OBJECT_ID,
        Value::Instance { id, .. } => *id as i64,
        other => {
            let mut hasher = DefaultHasher::new();
            other.class_name().hash(&mut hasher);
            other.to_display_string().hash(&mut hasher);
            hasher.finish() as i64
        }
    }
}

impl Protocols {
    /// Three-way comparison. Dispatches `<=>`; a nil result is a
    /// comparison fault naming both operand types, anything else is
    /// reduced via [`convert_compare_result`](Self::convert_compare_result).
    pub fn compare(
        &self,
        ctx: &Context,
        lhs: &Value,
        rhs: &Value,
    ) -> Result<Ordering, RuntimeError> {
        let result = self
            .compare_site
            .invoke(ctx, lhs, std::slice::from_ref(rhs))?;
        if matches!(result, Value::Nil) {
            return Err(RuntimeError::comparison_failed(lhs, rhs));
        }
        self.convert_compare_result(ctx, &result)
    }

    /// Reduce an arbitrary comparison outcome to a strict ordering. The
    /// outcome need not be numeric; it only has to answer `>` and `<`
    /// against zero. The greater-than check runs first: a malformed
    /// comparable that answers true to both reads as Greater.
    pub fn convert_compare_result(
        &self,
        ctx: &Context,
        result: &Value,
    ) -> Result<Ordering, RuntimeError> {
        let zero = Value::Int(0);
        let gt = self
            .greater_site
            .invoke(ctx, result, std::slice::from_ref(&zero))?;
        if is_true(&gt) {
            return Ok(Ordering::Greater);
        }
        let lt = self
            .less_site
            .invoke(ctx, result, std::slice::from_ref(&zero))?;
        if is_true(&lt) {
            return Ok(Ordering::Less);
        }
        Ok(Ordering::Equal)
    }

    /// Value equality: identity fast path, then `==` reduced to truth.
    pub fn is_equal(&self, ctx: &Context, lhs: &Value, rhs: &Value) -> Result<bool, RuntimeError> {
        if lhs.is_identical(rhs) {
            return Ok(true);
        }
        let result = self.equal_site.invoke(ctx, lhs, std::slice::from_ref(rhs))?;
        Ok(is_true(&result))
    }

    /// Capability probe: `respond_to?` with the interned method name.
    pub fn respond_to(
        &self,
        ctx: &Context,
        target: &Value,
        method_name: &str,
    ) -> Result<bool, RuntimeError> {
        let name = Value::Sym(Symbol::intern(method_name));
        let result = self.respond_to_site.invoke(ctx, target, &[name])?;
        Ok(is_true(&result))
    }

    /// Dispatch a one-argument `write` on `target`, discarding the result.
    pub fn write(&self, ctx: &Context, target: &Value, value: &Value) -> Result<(), RuntimeError> {
        self.write_site
            .invoke(ctx, target, std::slice::from_ref(value))?;
        Ok(())
    }
}
