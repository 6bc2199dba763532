//! Standard guest conversion logic. The guest's conversion rules are not
//! always consistent, but the common protocols are captured here once so
//! the rest of the runtime does not re-derive them by hand.

use std::sync::Arc;

use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive};

use crate::lexer::scan_float;
use crate::value::{IntegerValue, RuntimeError, Value};

use super::dispatch::{CallFlags, CallSignature, CallSite, ConversionSite, Dispatcher, SiteCache};
use super::Context;

/// Demote a bignum to a machine word whenever it fits.
pub fn normalize_bigint(x: BigInt) -> Value {
    match x.to_i64() {
        Some(i) => Value::Int(i),
        None => Value::BigInt(x),
    }
}

/// Normalize a wider machine integer, promoting to a bignum only when it
/// falls outside the machine-word signed range.
pub fn normalize_i128(x: i128) -> Value {
    match i64::try_from(x) {
        Ok(i) => Value::Int(i),
        Err(_) => Value::BigInt(BigInt::from(x)),
    }
}

pub fn normalize_u64(x: u64) -> Value {
    match i64::try_from(x) {
        Ok(i) => Value::Int(i),
        Err(_) => Value::BigInt(BigInt::from(x)),
    }
}

/// Normalize an arbitrary value: bignums that fit the machine word are
/// demoted, everything else passes through untouched.
pub fn normalize(value: Value) -> Value {
    match value {
        Value::BigInt(n) => normalize_bigint(n),
        other => other,
    }
}

/// Convert a bignum to a float, saturating to infinity when it falls
/// outside the f64 range and reporting the guest warning.
pub fn bignum_to_float(ctx: &Context, bignum: &BigInt) -> f64 {
    match bignum.to_f64() {
        Some(result) if result.is_finite() => result,
        _ => {
            ctx.report_warning("Bignum out of Float range");
            if bignum.is_negative() {
                f64::NEG_INFINITY
            } else {
                f64::INFINITY
            }
        }
    }
}

/// Run the guest float scanner over `text`. Succeeds only if the scan
/// consumed the entire string.
pub fn convert_string_to_float(text: &str) -> Result<f64, RuntimeError> {
    let (value, complete) = scan_float(text);
    if complete {
        Ok(value)
    } else {
        Err(RuntimeError::invalid_value_for(
            "Float",
            &format!("{:?}", text),
        ))
    }
}

/// Operand name used in conversion fault messages: literals for the
/// singleton values, the class name for everything else.
fn conversion_name(value: &Value) -> &str {
    match value {
        Value::Nil => "nil",
        Value::Bool(true) => "true",
        Value::Bool(false) => "false",
        other => other.class_name(),
    }
}

/// The conversion, comparison and coercion protocols, bound to one
/// dispatch substrate. Every call shape the protocols use is acquired
/// once here and reused across calls; the struct holds no other state
/// and is safe to share between execution contexts.
pub struct Protocols {
    pub(super) sites: SiteCache,
    to_str_cast: ConversionSite,
    to_s_site: Arc<CallSite>,
    to_path: ConversionSite,
    to_ary: ConversionSite,
    to_a: ConversionSite,
    to_int: ConversionSite,
    to_int_to_i: ConversionSite,
    to_f: ConversionSite,
    pub(super) compare_site: Arc<CallSite>,
    pub(super) greater_site: Arc<CallSite>,
    pub(super) less_site: Arc<CallSite>,
    pub(super) equal_site: Arc<CallSite>,
    pub(super) respond_to_site: Arc<CallSite>,
    pub(super) write_site: Arc<CallSite>,
    pub(super) coerce_site: Arc<CallSite>,
}

impl Protocols {
    pub fn new(dispatcher: Arc<dyn Dispatcher>) -> Self {
        let sites = SiteCache::new(dispatcher);
        let unary = CallSignature::new(1);
        let protocol0 = CallSignature::with_flags(0, CallFlags::protocol());
        Self {
            to_str_cast: ConversionSite::new(&sites, &["to_str"]),
            to_s_site: sites.acquire("to_s", protocol0),
            to_path: ConversionSite::new(&sites, &["to_path", "to_str"]),
            to_ary: ConversionSite::new(&sites, &["to_ary"]),
            to_a: ConversionSite::new(&sites, &["to_a"]),
            to_int: ConversionSite::new(&sites, &["to_int"]),
            to_int_to_i: ConversionSite::new(&sites, &["to_int", "to_i"]),
            to_f: ConversionSite::new(&sites, &["to_f"]),
            compare_site: sites.acquire("<=>", unary),
            greater_site: sites.acquire(">", unary),
            less_site: sites.acquire("<", unary),
            equal_site: sites.acquire("==", unary),
            respond_to_site: sites.acquire("respond_to?", unary),
            write_site: sites.acquire("write", unary),
            coerce_site: sites.acquire("coerce", CallSignature::with_flags(1, CallFlags::protocol())),
            sites,
        }
    }

    // ---- String conversion ----

    /// Strict string conversion via the `to_str` protocol.
    pub fn cast_to_string(&self, ctx: &Context, obj: &Value) -> Result<String, RuntimeError> {
        self.string_conversion(ctx, obj, &self.to_str_cast)
    }

    /// Lenient string conversion: a receiver without `to_str` declines
    /// rather than faulting. A `to_str` that returns the wrong type is
    /// still a fault.
    pub fn try_cast_to_string(
        &self,
        ctx: &Context,
        obj: &Value,
    ) -> Result<Option<String>, RuntimeError> {
        match self.to_str_cast.convert(ctx, obj)? {
            Some((_, Value::Str(s))) => Ok(Some(s)),
            Some((_, Value::Nil)) | None => Ok(None),
            Some((method, other)) => Err(RuntimeError::return_type_error(
                obj.class_name(),
                &method.name(),
                "String",
                other.class_name(),
            )),
        }
    }

    /// `to_s` conversion. Every value has a display string, so this never
    /// declines: a missing or misbehaving `to_s` falls back to the
    /// default rendering.
    pub fn convert_to_string(&self, ctx: &Context, obj: &Value) -> Result<String, RuntimeError> {
        match self.to_s_site.try_invoke(ctx, obj, &[])? {
            Some(Value::Str(s)) => Ok(s),
            _ => Ok(obj.to_display_string()),
        }
    }

    /// `to_s` conversion that swallows every fault the guest method may
    /// raise, for diagnostics that must not themselves fail.
    pub fn convert_to_string_no_fault(&self, ctx: &Context, obj: &Value) -> String {
        match self.convert_to_string(ctx, obj) {
            Ok(s) => s,
            Err(e) => format!(
                "<{}.to_s raised an exception: '{}'>",
                obj.class_name(),
                e.message
            ),
        }
    }

    /// Path-style string conversion: `to_path` if defined, else `to_str`.
    pub fn cast_to_path(&self, ctx: &Context, obj: &Value) -> Result<String, RuntimeError> {
        self.string_conversion(ctx, obj, &self.to_path)
    }

    fn string_conversion(
        &self,
        ctx: &Context,
        obj: &Value,
        site: &ConversionSite,
    ) -> Result<String, RuntimeError> {
        match site.convert(ctx, obj)? {
            Some((_, Value::Str(s))) => Ok(s),
            Some((_, Value::Nil)) => Err(RuntimeError::type_conversion("nil", "String")),
            Some((method, other)) => Err(RuntimeError::return_type_error(
                obj.class_name(),
                &method.name(),
                "String",
                other.class_name(),
            )),
            None => Err(RuntimeError::type_conversion(conversion_name(obj), "String")),
        }
    }

    // ---- Sequence conversion ----

    /// Strict sequence conversion via the `to_ary` protocol.
    pub fn cast_to_array(
        &self,
        ctx: &Context,
        obj: &Value,
    ) -> Result<Arc<Vec<Value>>, RuntimeError> {
        match self.to_ary.convert(ctx, obj)? {
            Some((_, Value::Array(items))) => Ok(items),
            Some((method, other)) => Err(RuntimeError::return_type_error(
                obj.class_name(),
                &method.name(),
                "Array",
                other.class_name(),
            )),
            None => Err(RuntimeError::type_conversion(conversion_name(obj), "Array")),
        }
    }

    /// Lenient `to_ary`. Callers that want "strict, then lenient-A, then
    /// lenient-B" chain this with [`try_convert_to_array`](Self::try_convert_to_array).
    pub fn try_cast_to_array(
        &self,
        ctx: &Context,
        obj: &Value,
    ) -> Result<Option<Arc<Vec<Value>>>, RuntimeError> {
        self.lenient_array_conversion(ctx, obj, &self.to_ary)
    }

    /// Lenient `to_a`, the second fallback stage.
    pub fn try_convert_to_array(
        &self,
        ctx: &Context,
        obj: &Value,
    ) -> Result<Option<Arc<Vec<Value>>>, RuntimeError> {
        self.lenient_array_conversion(ctx, obj, &self.to_a)
    }

    fn lenient_array_conversion(
        &self,
        ctx: &Context,
        obj: &Value,
        site: &ConversionSite,
    ) -> Result<Option<Arc<Vec<Value>>>, RuntimeError> {
        match site.convert(ctx, obj)? {
            Some((_, Value::Array(items))) => Ok(Some(items)),
            Some((_, Value::Nil)) | None => Ok(None),
            Some((method, other)) => Err(RuntimeError::return_type_error(
                obj.class_name(),
                &method.name(),
                "Array",
                other.class_name(),
            )),
        }
    }

    // ---- Integer conversion ----

    /// Composite integer conversion: `to_int`, falling back to `to_i`.
    pub fn convert_to_integer(
        &self,
        ctx: &Context,
        value: &Value,
    ) -> Result<IntegerValue, RuntimeError> {
        self.integer_conversion(ctx, value, &self.to_int_to_i)
    }

    /// Strict integer conversion: `to_int` only, no fallback.
    pub fn cast_to_integer(
        &self,
        ctx: &Context,
        value: &Value,
    ) -> Result<IntegerValue, RuntimeError> {
        self.integer_conversion(ctx, value, &self.to_int)
    }

    /// Strict conversion to a machine-word integer. Unlike
    /// [`cast_to_integer`](Self::cast_to_integer) the result is a plain
    /// `i64`; a bignum that does not fit is a range fault.
    pub fn cast_to_fixnum(&self, ctx: &Context, value: &Value) -> Result<i64, RuntimeError> {
        self.cast_to_integer(ctx, value)?.to_fixnum()
    }

    /// Strict float conversion via the `to_f` protocol.
    pub fn cast_to_float(&self, ctx: &Context, value: &Value) -> Result<f64, RuntimeError> {
        match self.to_f.convert(ctx, value)? {
            Some((_, Value::Num(f))) => Ok(f),
            Some((method, other)) => Err(RuntimeError::return_type_error(
                value.class_name(),
                &method.name(),
                "Float",
                other.class_name(),
            )),
            None => Err(RuntimeError::type_conversion(conversion_name(value), "Float")),
        }
    }

    fn integer_conversion(
        &self,
        ctx: &Context,
        value: &Value,
        site: &ConversionSite,
    ) -> Result<IntegerValue, RuntimeError> {
        match site.convert(ctx, value)? {
            Some((method, result)) => IntegerValue::from_value(&result).ok_or_else(|| {
                RuntimeError::return_type_error(
                    value.class_name(),
                    &method.name(),
                    "Integer",
                    result.class_name(),
                )
            }),
            None => Err(RuntimeError::type_conversion(
                conversion_name(value),
                "Integer",
            )),
        }
    }

    // ---- Unsigned extraction ----

    /// Like [`cast_to_integer`](Self::cast_to_integer), reinterpreted as
    /// unsigned 32-bit: fixnums wrap, bignums narrow checked.
    pub fn cast_to_u32(&self, ctx: &Context, obj: &Value) -> Result<u32, RuntimeError> {
        if matches!(obj, Value::Nil) {
            return Err(RuntimeError::no_implicit_nil_conversion());
        }
        self.cast_to_integer(ctx, obj)?.to_u32_unchecked()
    }

    /// Unsigned 64-bit variant of [`cast_to_u32`](Self::cast_to_u32).
    pub fn cast_to_u64(&self, ctx: &Context, obj: &Value) -> Result<u64, RuntimeError> {
        if matches!(obj, Value::Nil) {
            return Err(RuntimeError::no_implicit_nil_conversion());
        }
        self.cast_to_integer(ctx, obj)?.to_u64_unchecked()
    }
}
