use std::any::TypeId;

/// Descriptor for a host (Rust-side) type that guest classes can be
/// projected from. Interop surfaces hand these out; the guest never
/// inspects them beyond the name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostType {
    pub name: String,
    pub type_id: TypeId,
}

impl HostType {
    pub fn of<T: 'static>(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_id: TypeId::of::<T>(),
        }
    }
}

/// A guest class or module. Classes built over a host type keep the
/// descriptor around so interop calls can recover it.
#[derive(Debug)]
pub struct ClassSpec {
    pub name: String,
    pub host_type: Option<std::sync::Arc<HostType>>,
}

impl ClassSpec {
    pub fn class(name: impl Into<String>, host_type: std::sync::Arc<HostType>) -> Self {
        Self {
            name: name.into(),
            host_type: Some(host_type),
        }
    }

    pub fn module(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host_type: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_type_identity_tracks_the_rust_type() {
        let a = HostType::of::<String>("String");
        let b = HostType::of::<String>("String");
        let c = HostType::of::<i64>("Fixnum");
        assert_eq!(a, b);
        assert_ne!(a.type_id, c.type_id);
    }

    #[test]
    fn modules_carry_no_host_type() {
        assert!(ClassSpec::module("Comparable").host_type.is_none());
    }
}
