//! At-most-once backend slot.

use once_cell::sync::OnceCell;
use std::sync::Arc;
use tracing::{error, info};

use crate::context::TraceContext;
use crate::factory::registry::BackendFactory;
use crate::observability;
use crate::outcome::{BoxError, BoxResult, Code};
use crate::validate::{Validate, Validator};

struct Installed<T: ?Sized> {
    handle: Arc<T>,
    backend: String,
}

/// Holds the single backend of one facade for the lifetime of the owner.
///
/// The first successful `initialize` wins; later calls return the same
/// handle without looking at their options. Readers after initialization
/// take no locks.
pub struct BackendSlot<T: ?Sized, O> {
    factory: BackendFactory<T, O>,
    validator: Validator,
    cell: OnceCell<Result<Installed<T>, BoxError>>,
}

impl<T, O> BackendSlot<T, O>
where
    T: ?Sized + Send + Sync,
    O: Validate,
{
    pub fn new(factory: BackendFactory<T, O>) -> Self {
        Self::with_validator(factory, Validator::default())
    }

    /// Use a specific validator (e.g. a localized one) for option checks.
    pub fn with_validator(factory: BackendFactory<T, O>, validator: Validator) -> Self {
        Self {
            factory,
            validator,
            cell: OnceCell::new(),
        }
    }

    /// Construct the backend once and publish it.
    ///
    /// Invalid options return a `PARAM_INVALID` error and leave the slot
    /// empty. A constructor failure is remembered and returned to every
    /// later caller.
    pub fn initialize(&self, ctx: &TraceContext, discriminator: &str, options: O) -> BoxResult<Arc<T>> {
        if let Some(state) = self.cell.get() {
            return Self::share(state);
        }

        self.validator.validate(&options).map_err(BoxError::from)?;

        let state = self.cell.get_or_init(|| {
            let backend = self
                .factory
                .resolve(discriminator)
                .unwrap_or(discriminator)
                .to_string();
            match self.factory.build(ctx, discriminator, &options) {
                Ok(handle) => {
                    info!(
                        trace = %ctx,
                        subsystem = self.factory.subsystem(),
                        backend = %backend,
                        "Backend initialized"
                    );
                    observability::metrics::record_backend_initialized(self.factory.subsystem());
                    Ok(Installed { handle, backend })
                }
                Err(cause) => {
                    error!(
                        trace = %ctx,
                        subsystem = self.factory.subsystem(),
                        backend = %backend,
                        error = %cause,
                        "Backend initialization failed"
                    );
                    Err(BoxError::new(
                        Code::INTERRUPT,
                        format!("initialization failed: {}", self.factory.subsystem()),
                    )
                    .with_cause(cause))
                }
            }
        });
        Self::share(state)
    }

    /// The published handle, or an error if the slot is empty or failed.
    pub fn handle(&self) -> BoxResult<Arc<T>> {
        match self.cell.get() {
            Some(state) => Self::share(state),
            None => Err(BoxError::new(
                Code::INTERRUPT,
                format!("{} backend not initialized", self.factory.subsystem()),
            )),
        }
    }

    pub fn get(&self) -> Option<Arc<T>> {
        self.handle().ok()
    }

    pub fn is_initialized(&self) -> bool {
        matches!(self.cell.get(), Some(Ok(_)))
    }

    /// Name of the backend actually constructed.
    pub fn backend(&self) -> Option<&str> {
        match self.cell.get() {
            Some(Ok(installed)) => Some(installed.backend.as_str()),
            _ => None,
        }
    }

    pub fn subsystem(&self) -> &'static str {
        self.factory.subsystem()
    }

    fn share(state: &Result<Installed<T>, BoxError>) -> BoxResult<Arc<T>> {
        match state {
            Ok(installed) => Ok(Arc::clone(&installed.handle)),
            Err(err) => Err(err.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::Field;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::thread;

    struct Probe {
        size: u32,
    }

    #[derive(Clone)]
    struct ProbeOption {
        size: u32,
    }

    impl Validate for ProbeOption {
        fn fields(&self) -> Vec<Field> {
            vec![Field::new("size", "size", self.size, "required,lte=100")]
        }
    }

    fn slot(built: Arc<AtomicUsize>) -> BackendSlot<Probe, ProbeOption> {
        let mut factory = BackendFactory::<Probe, ProbeOption>::new("probe");
        factory.register("probe", move |_, opt: &ProbeOption| {
            built.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(Probe { size: opt.size }))
        });
        factory.register("broken", |_, _| {
            Err(BoxError::new(Code::CALL_ERROR, "backend refused"))
        });
        BackendSlot::new(factory)
    }

    fn ctx() -> TraceContext {
        TraceContext::new("t-slot-0000000001", "test")
    }

    #[test]
    fn test_concurrent_initialize_constructs_once() {
        let built = Arc::new(AtomicUsize::new(0));
        let slot = Arc::new(slot(built.clone()));
        let barrier = Arc::new(Barrier::new(16));

        let handles: Vec<_> = (1..=16u32)
            .map(|size| {
                let slot = slot.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    slot.initialize(&ctx(), "probe", ProbeOption { size }).unwrap()
                })
            })
            .collect();

        let results: Vec<Arc<Probe>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(built.load(Ordering::SeqCst), 1);
        for probe in &results {
            assert!(Arc::ptr_eq(probe, &results[0]));
        }
    }

    #[test]
    fn test_reinitialize_is_noop() {
        let built = Arc::new(AtomicUsize::new(0));
        let slot = slot(built.clone());

        let first = slot.initialize(&ctx(), "probe", ProbeOption { size: 5 }).unwrap();
        // invalid options are ignored once a handle exists
        let second = slot.initialize(&ctx(), "broken", ProbeOption { size: 500 }).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.size, 5);
        assert_eq!(built.load(Ordering::SeqCst), 1);
        assert_eq!(slot.backend(), Some("probe"));
    }

    #[test]
    fn test_invalid_options_leave_slot_empty() {
        let slot = slot(Arc::new(AtomicUsize::new(0)));

        let err = slot.initialize(&ctx(), "probe", ProbeOption { size: 0 }).err().unwrap();
        assert_eq!(err.code, Code::PARAM_INVALID);
        assert_eq!(err.label, "size is required");
        assert!(!slot.is_initialized());
        assert!(slot.handle().is_err());

        let probe = slot.initialize(&ctx(), "probe", ProbeOption { size: 7 }).unwrap();
        assert_eq!(probe.size, 7);
    }

    #[test]
    fn test_unknown_discriminator_falls_back() {
        let slot = slot(Arc::new(AtomicUsize::new(0)));
        let probe = slot.initialize(&ctx(), "redis", ProbeOption { size: 3 }).unwrap();
        assert_eq!(probe.size, 3);
        assert_eq!(slot.backend(), Some("probe"));
    }

    #[test]
    fn test_constructor_failure_is_sticky() {
        let built = Arc::new(AtomicUsize::new(0));
        let slot = slot(built.clone());

        let err = slot.initialize(&ctx(), "broken", ProbeOption { size: 1 }).err().unwrap();
        assert_eq!(err.code, Code::INTERRUPT);
        assert_eq!(err.label, "initialization failed: probe");

        let again = slot.initialize(&ctx(), "probe", ProbeOption { size: 1 }).err().unwrap();
        assert_eq!(again.code, Code::INTERRUPT);
        assert_eq!(built.load(Ordering::SeqCst), 0);
        assert!(slot.get().is_none());
    }
}
