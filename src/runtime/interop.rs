use std::sync::Arc;

use crate::value::{HostType, RuntimeError, Value};

use super::Context;

/// Recover the host type descriptor behind a guest class reference.
/// Trackers unwrap directly; guest classes yield the type they are
/// projected from; everything else (including plain modules) faults.
pub fn to_type(value: &Value) -> Result<Arc<HostType>, RuntimeError> {
    match value {
        Value::HostType(tracker) => Ok(tracker.clone()),
        Value::Class(spec) => spec.host_type.clone().ok_or_else(|| invalid_class(value)),
        _ => Err(invalid_class(value)),
    }
}

/// Map [`to_type`] over a parameter list, failing on the first invalid
/// element.
pub fn to_types(values: &[Value]) -> Result<Vec<Arc<HostType>>, RuntimeError> {
    values.iter().map(to_type).collect()
}

fn invalid_class(value: &Value) -> RuntimeError {
    RuntimeError::type_error(format!("invalid value for Class: {}", value.class_name()))
}

/// Deny the operation when the context already runs at or above `level`.
pub fn check_safe_level(ctx: &Context, level: i32) -> Result<(), RuntimeError> {
    if level <= ctx.current_safe_level() {
        return Err(RuntimeError::security_error(format!(
            "Insecure operation at level {}",
            ctx.current_safe_level()
        )));
    }
    Ok(())
}

/// Same gate, with the attempted operation named in the fault message.
pub fn check_safe_level_for(ctx: &Context, level: i32, method: &str) -> Result<(), RuntimeError> {
    if level <= ctx.current_safe_level() {
        return Err(RuntimeError::security_error(format!(
            "Insecure operation {} at level {}",
            method,
            ctx.current_safe_level()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{ClassSpec, FaultKind};

    #[test]
    fn trackers_and_classes_yield_their_descriptor() {
        let descriptor = Arc::new(HostType::of::<String>("String"));
        let tracker = Value::HostType(descriptor.clone());
        assert_eq!(to_type(&tracker).unwrap(), descriptor);

        let class = Value::Class(Arc::new(ClassSpec::class("String", descriptor.clone())));
        assert_eq!(to_type(&class).unwrap(), descriptor);
    }

    #[test]
    fn modules_and_plain_values_fault() {
        let module = Value::Class(Arc::new(ClassSpec::module("Comparable")));
        let err = to_type(&module).unwrap_err();
        assert_eq!(err.kind, FaultKind::Type);

        let err = to_type(&Value::Int(3)).unwrap_err();
        assert_eq!(err.message, "invalid value for Class: Fixnum");
    }

    #[test]
    fn to_types_stops_at_the_first_invalid_element() {
        let descriptor = Arc::new(HostType::of::<i64>("Fixnum"));
        let ok = Value::HostType(descriptor);
        assert_eq!(to_types(&[ok.clone(), ok.clone()]).unwrap().len(), 2);
        assert!(to_types(&[ok, Value::Nil]).is_err());
    }

    #[test]
    fn safety_gate_threshold_is_inclusive() {
        let ctx = Context::with_safe_level(2);
        let err = check_safe_level(&ctx, 2).unwrap_err();
        assert_eq!(err.kind, FaultKind::Security);
        assert_eq!(err.message, "Insecure operation at level 2");
        assert!(check_safe_level(&ctx, 3).is_ok());

        let relaxed = Context::with_safe_level(1);
        assert!(check_safe_level(&relaxed, 2).is_ok());
    }

    #[test]
    fn named_gate_mentions_the_operation() {
        let ctx = Context::with_safe_level(4);
        let err = check_safe_level_for(&ctx, 4, "untaint").unwrap_err();
        assert_eq!(err.message, "Insecure operation untaint at level 4");
    }
}
