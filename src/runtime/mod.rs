mod context;
mod dispatch;
mod interop;
mod protocols;
mod protocols_cmp;
mod protocols_coerce;

pub use context::Context;
pub use dispatch::{
    CallFlags, CallSignature, CallSite, ConversionSite, Dispatcher, DynamicMethod, SiteCache,
};
pub use interop::{check_safe_level, check_safe_level_for, to_type, to_types};
pub use protocols::{
    Protocols, bignum_to_float, convert_string_to_float, normalize, normalize_bigint,
    normalize_i128, normalize_u64,
};
pub use protocols_cmp::{is_true, to_hash_code};
