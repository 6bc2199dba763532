use super::Value;
use crate::symbol::Symbol;

/// Classification of a runtime fault. Mirrors the guest exception
/// hierarchy closely enough for the coercion protocol to tell the
/// "recoverable" category (what an unqualified guest `rescue` catches)
/// apart from faults that must always propagate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// Wrong operand type for a conversion or operation.
    Type,
    /// Numeric value does not fit the requested target width.
    Range,
    /// Three-way comparison or coercion-based relation failed.
    Comparison,
    /// Coercion-based arithmetic could not be established.
    Coercion,
    /// Operation attempted at or above the safety-gate threshold.
    Security,
    /// Method resolution failed and no fallback hook applied.
    NoMethod,
    /// Host-level condition outside the guest exception hierarchy.
    Fatal,
}

impl FaultKind {
    /// True for the faults an unqualified guest `rescue` would catch.
    /// Security faults sit outside that category, as do host-fatal ones.
    pub fn is_recoverable(self) -> bool {
        !matches!(self, FaultKind::Security | FaultKind::Fatal)
    }
}

impl std::fmt::Display for FaultKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FaultKind::Type => "TypeError",
            FaultKind::Range => "RangeError",
            FaultKind::Comparison => "ComparisonError",
            FaultKind::Coercion => "CoercionError",
            FaultKind::Security => "SecurityError",
            FaultKind::NoMethod => "NoMethodError",
            FaultKind::Fatal => "FatalError",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug)]
pub struct RuntimeError {
    pub kind: FaultKind,
    pub message: String,
}

impl RuntimeError {
    pub fn new(kind: FaultKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn is_recoverable(&self) -> bool {
        self.kind.is_recoverable()
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(FaultKind::Type, message)
    }

    pub fn range_error(message: impl Into<String>) -> Self {
        Self::new(FaultKind::Range, message)
    }

    /// `can't convert Foo into Bar`
    pub fn type_conversion(from: &str, to: &str) -> Self {
        Self::type_error(format!("can't convert {} into {}", from, to))
    }

    /// `can't convert Foo to Bar (Foo#to_x gives Baz)` — the conversion
    /// method exists but returned a value of the wrong guest type.
    pub fn return_type_error(class: &str, method: &str, to: &str, got: &str) -> Self {
        Self::type_error(format!(
            "can't convert {} to {} ({}#{} gives {})",
            class, to, class, method, got
        ))
    }

    pub fn no_implicit_nil_conversion() -> Self {
        Self::type_error("no implicit conversion from nil to integer")
    }

    /// `invalid value for Float(): "abc"` and friends.
    pub fn invalid_value_for(target: &str, text: &str) -> Self {
        Self::type_error(format!("invalid value for {}(): {}", target, text))
    }

    /// `comparison of Foo with Bar failed`
    pub fn comparison_failed(lhs: &Value, rhs: &Value) -> Self {
        Self::new(
            FaultKind::Comparison,
            format!(
                "comparison of {} with {} failed",
                lhs.class_name(),
                rhs.class_name()
            ),
        )
    }

    /// `Foo can't be coerced into Bar` — note the operand order: the
    /// value that failed to coerce comes first.
    pub fn coercion_failed(other: &Value, this: &Value) -> Self {
        Self::new(
            FaultKind::Coercion,
            format!(
                "{} can't be coerced into {}",
                other.class_name(),
                this.class_name()
            ),
        )
    }

    pub fn security_error(message: impl Into<String>) -> Self {
        Self::new(FaultKind::Security, message)
    }

    /// `undefined method 'name' for Foo`
    pub fn no_method(name: Symbol, receiver: &Value) -> Self {
        Self::new(
            FaultKind::NoMethod,
            format!("undefined method '{}' for {}", name, receiver.class_name()),
        )
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self::new(FaultKind::Fatal, message)
    }
}
