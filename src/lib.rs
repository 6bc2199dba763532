//! Conversion and coercion protocols for a hosted Ruby-style dynamic
//! language runtime.
//!
//! The guest language's conversion rules (`to_str`/`to_ary`/`to_int`
//! protocols and friends), three-way comparison, truthiness, equality and
//! the operand-driven `coerce` convention are implemented here once, on
//! top of an injected dispatch substrate ([`runtime::Dispatcher`]), so
//! every operator and built-in in the runtime shares the same — correct —
//! semantics instead of hand-rolling them.

pub mod lexer;
pub mod runtime;
pub mod symbol;
pub mod value;

pub use runtime::{
    CallFlags, CallSignature, CallSite, Context, ConversionSite, Dispatcher, DynamicMethod,
    Protocols, SiteCache, bignum_to_float, check_safe_level, check_safe_level_for,
    convert_string_to_float, is_true, normalize, normalize_bigint, normalize_i128, normalize_u64,
    to_hash_code, to_type, to_types,
};
pub use symbol::Symbol;
pub use value::{ClassSpec, FaultKind, HostType, IntegerValue, RuntimeError, Value};
