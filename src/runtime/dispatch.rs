use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use crate::symbol::Symbol;
use crate::value::{RuntimeError, Value};

use super::Context;

/// A resolved guest method, ready to invoke.
pub type DynamicMethod =
    Arc<dyn Fn(&Context, &Value, &[Value]) -> Result<Value, RuntimeError> + Send + Sync>;

/// Call-mode flags baked into a dispatch site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CallFlags {
    /// The call has an implicit receiver, so private methods resolve.
    pub implicit_self: bool,
    /// Do not fall back to the guest's `method_missing` hook; an
    /// unresolved method is reported as a plain no-method fault. The
    /// protocol layer uses this where "not implemented" must be a clean
    /// signal rather than a secondary dispatch.
    pub suppress_method_missing: bool,
}

impl CallFlags {
    /// Flags for internal protocol dispatches (`coerce`, conversion
    /// methods): implicit receiver, no `method_missing` fallback.
    pub fn protocol() -> Self {
        Self {
            implicit_self: true,
            suppress_method_missing: true,
        }
    }
}

/// The shape of a call: argument count plus call-mode flags. Together
/// with the method name this keys the site cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallSignature {
    pub arity: usize,
    pub flags: CallFlags,
}

impl CallSignature {
    pub fn new(arity: usize) -> Self {
        Self {
            arity,
            flags: CallFlags::default(),
        }
    }

    pub fn with_flags(arity: usize, flags: CallFlags) -> Self {
        Self { arity, flags }
    }
}

/// Method resolution, supplied by the object model. The protocol layer
/// never looks methods up itself; it acquires sites and invokes through
/// them.
pub trait Dispatcher: Send + Sync {
    /// Resolve `name` on the class of `receiver`, or `None` when the
    /// receiver has no such method.
    fn resolve(&self, receiver: &Value, name: Symbol, sig: CallSignature) -> Option<DynamicMethod>;
}

const METHOD_MISSING: &str = "method_missing";

/// A cacheable binding of one call shape to a dispatch strategy. Holds a
/// monomorphic inline cache keyed on the receiver's interned class name;
/// a receiver of a different class re-resolves and replaces the entry.
pub struct CallSite {
    name: Symbol,
    sig: CallSignature,
    dispatcher: Arc<dyn Dispatcher>,
    cache: Mutex<Option<(Symbol, DynamicMethod)>>,
}

impl CallSite {
    fn new(name: Symbol, sig: CallSignature, dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self {
            name,
            sig,
            dispatcher,
            cache: Mutex::new(None),
        }
    }

    pub fn name(&self) -> Symbol {
        self.name
    }

    fn lookup(&self, receiver: &Value) -> Option<DynamicMethod> {
        let key = Symbol::intern(receiver.class_name());
        {
            let cache = self.cache.lock().unwrap();
            if let Some((cached_key, method)) = &*cache
                && *cached_key == key
            {
                return Some(method.clone());
            }
        }
        let method = self.dispatcher.resolve(receiver, self.name, self.sig)?;
        *self.cache.lock().unwrap() = Some((key, method.clone()));
        Some(method)
    }

    /// Invoke if the receiver defines the method; `Ok(None)` when it does
    /// not. No `method_missing` fallback, no fault for the missing case.
    pub fn try_invoke(
        &self,
        ctx: &Context,
        receiver: &Value,
        args: &[Value],
    ) -> Result<Option<Value>, RuntimeError> {
        match self.lookup(receiver) {
            Some(method) => method(ctx, receiver, args).map(Some),
            None => Ok(None),
        }
    }

    /// Invoke, falling back to the guest's `method_missing` hook unless
    /// the site's flags suppress it. An unresolved call faults.
    pub fn invoke(
        &self,
        ctx: &Context,
        receiver: &Value,
        args: &[Value],
    ) -> Result<Value, RuntimeError> {
        if let Some(result) = self.try_invoke(ctx, receiver, args)? {
            return Ok(result);
        }
        if !self.sig.flags.suppress_method_missing {
            let hook_sig = CallSignature::with_flags(self.sig.arity + 1, self.sig.flags);
            if let Some(hook) =
                self.dispatcher
                    .resolve(receiver, Symbol::intern(METHOD_MISSING), hook_sig)
            {
                let mut hook_args = Vec::with_capacity(args.len() + 1);
                hook_args.push(Value::Sym(self.name));
                hook_args.extend_from_slice(args);
                return hook(ctx, receiver, &hook_args);
            }
        }
        Err(RuntimeError::no_method(self.name, receiver))
    }
}

/// Owns the dispatch sites acquired so far, keyed by call shape. Sites
/// are shared and reused; acquiring the same shape twice yields the same
/// site (and therefore the same inline cache).
pub struct SiteCache {
    dispatcher: Arc<dyn Dispatcher>,
    sites: RwLock<HashMap<(Symbol, CallSignature), Arc<CallSite>>>,
}

impl SiteCache {
    pub fn new(dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self {
            dispatcher,
            sites: RwLock::new(HashMap::new()),
        }
    }

    pub fn acquire(&self, name: &str, sig: CallSignature) -> Arc<CallSite> {
        let sym = Symbol::intern(name);
        {
            let sites = self.sites.read().unwrap();
            if let Some(site) = sites.get(&(sym, sig)) {
                return site.clone();
            }
        }
        let mut sites = self.sites.write().unwrap();
        sites
            .entry((sym, sig))
            .or_insert_with(|| Arc::new(CallSite::new(sym, sig, self.dispatcher.clone())))
            .clone()
    }
}

/// A conversion strategy: an ordered chain of zero-argument conversion
/// methods tried until one resolves. The fallback order (`to_int` then
/// `to_i`, `to_path` then `to_str`) is a property of the strategy, not of
/// the protocol functions that select it.
pub struct ConversionSite {
    steps: Vec<Arc<CallSite>>,
}

impl ConversionSite {
    pub fn new(sites: &SiteCache, methods: &[&str]) -> Self {
        let sig = CallSignature::with_flags(0, CallFlags::protocol());
        Self {
            steps: methods.iter().map(|m| sites.acquire(m, sig)).collect(),
        }
    }

    /// Run the first step the receiver implements. `Ok(None)` means no
    /// step applied; faults raised by the conversion method propagate.
    /// On success the name of the method that produced the result is
    /// returned alongside it, for fault messages.
    pub fn convert(
        &self,
        ctx: &Context,
        value: &Value,
    ) -> Result<Option<(Symbol, Value)>, RuntimeError> {
        for site in &self.steps {
            if let Some(result) = site.try_invoke(ctx, value, &[])? {
                return Ok(Some((site.name(), result)));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts resolutions so the tests can observe the inline cache.
    struct CountingDispatcher {
        resolutions: AtomicUsize,
    }

    impl Dispatcher for CountingDispatcher {
        fn resolve(
            &self,
            receiver: &Value,
            name: Symbol,
            _sig: CallSignature,
        ) -> Option<DynamicMethod> {
            self.resolutions.fetch_add(1, Ordering::SeqCst);
            if name == Symbol::intern("to_int") && matches!(receiver, Value::Int(_)) {
                Some(Arc::new(|_ctx, recv: &Value, _args: &[Value]| {
                    Ok(recv.clone())
                }))
            } else {
                None
            }
        }
    }

    #[test]
    fn inline_cache_avoids_re_resolution() {
        let dispatcher = Arc::new(CountingDispatcher {
            resolutions: AtomicUsize::new(0),
        });
        let sites = SiteCache::new(dispatcher.clone());
        let site = sites.acquire("to_int", CallSignature::new(0));
        let ctx = Context::new();

        for i in 0..5 {
            let result = site.try_invoke(&ctx, &Value::Int(i), &[]).unwrap();
            assert_eq!(result, Some(Value::Int(i)));
        }
        assert_eq!(dispatcher.resolutions.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cache_invalidates_on_receiver_class_change() {
        let dispatcher = Arc::new(CountingDispatcher {
            resolutions: AtomicUsize::new(0),
        });
        let sites = SiteCache::new(dispatcher.clone());
        let site = sites.acquire("to_int", CallSignature::new(0));
        let ctx = Context::new();

        site.try_invoke(&ctx, &Value::Int(1), &[]).unwrap();
        // Different receiver class misses the cache.
        assert_eq!(site.try_invoke(&ctx, &Value::Nil, &[]).unwrap(), None);
        assert!(dispatcher.resolutions.load(Ordering::SeqCst) >= 2);
    }

    #[test]
    fn acquiring_the_same_shape_reuses_the_site() {
        let dispatcher = Arc::new(CountingDispatcher {
            resolutions: AtomicUsize::new(0),
        });
        let sites = SiteCache::new(dispatcher);
        let a = sites.acquire("to_str", CallSignature::new(0));
        let b = sites.acquire("to_str", CallSignature::new(0));
        assert!(Arc::ptr_eq(&a, &b));

        let c = sites.acquire("to_str", CallSignature::new(1));
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[test]
    fn unresolved_call_faults_with_no_method() {
        let dispatcher = Arc::new(CountingDispatcher {
            resolutions: AtomicUsize::new(0),
        });
        let sites = SiteCache::new(dispatcher);
        let site = sites.acquire("coerce", CallSignature::with_flags(1, CallFlags::protocol()));
        let ctx = Context::new();

        let err = site.invoke(&ctx, &Value::Str("x".into()), &[Value::Int(1)]).unwrap_err();
        assert_eq!(err.kind, crate::value::FaultKind::NoMethod);
        assert!(err.is_recoverable());
    }
}
