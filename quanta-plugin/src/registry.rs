//! Service Registry

use crate::ProviderError;
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use tracing::{debug, warn};

/// Priority of a registry that was not given one explicitly
pub const DEFAULT_PRIORITY: i32 = 10;

type ErasedService = Box<dyn Any + Send + Sync>;
type ErasedFactory = Box<dyn Fn() -> Result<ErasedService, ProviderError> + Send + Sync>;

/// One registered factory for a service type
struct Loader {
    name: String,
    load: ErasedFactory,
}

/// Central service registry
///
/// Services are looked up by their trait-object type (`dyn UnitFormat`).
/// Each service type is loaded once: the first lookup runs every factory
/// registered for it, and all later lookups share the cached result.
pub struct ServiceRegistry {
    priority: i32,
    loaders: HashMap<TypeId, Vec<Loader>>,
    cache: RwLock<HashMap<TypeId, Arc<OnceLock<ErasedService>>>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self {
            priority: DEFAULT_PRIORITY,
            loaders: HashMap::new(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Register a factory for service type `T`.
    ///
    /// Factories run in registration order on the first lookup of `T`.
    pub fn with_provider<T, F>(mut self, name: &str, factory: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn() -> Result<Arc<T>, ProviderError> + Send + Sync + 'static,
    {
        let load: ErasedFactory = Box::new(move || {
            factory().map(|service| Box::new(service) as ErasedService)
        });
        self.loaders
            .entry(TypeId::of::<Arc<T>>())
            .or_default()
            .push(Loader { name: name.to_string(), load });
        self
    }

    /// Register a ready-made service instance.
    pub fn with_service<T>(self, name: &str, service: Arc<T>) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.with_provider::<T, _>(name, move || Ok(Arc::clone(&service)))
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// All services of type `T`, in registration order.
    ///
    /// Providers whose factory fails are logged and skipped.
    pub fn get_services<T>(&self) -> Vec<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let key = TypeId::of::<Arc<T>>();
        let cell = self.cell(key);
        let loaded = cell.get_or_init(|| Box::new(self.load::<T>(key)));
        loaded
            .downcast_ref::<Vec<Arc<T>>>()
            .cloned()
            .unwrap_or_default()
    }

    /// First service of type `T`, if any provider loaded.
    pub fn get_service<T>(&self) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.get_services::<T>().into_iter().next()
    }

    /// Like `get_service`, but an absent service is an error.
    pub fn require_service<T>(&self) -> Result<Arc<T>, ProviderError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.get_service::<T>()
            .ok_or(ProviderError::Unavailable(type_name::<T>()))
    }

    /// Names of the providers registered for `T`, loaded or not.
    pub fn provider_names<T>(&self) -> Vec<&str>
    where
        T: ?Sized + 'static,
    {
        self.loaders
            .get(&TypeId::of::<Arc<T>>())
            .map(|loaders| loaders.iter().map(|l| l.name.as_str()).collect())
            .unwrap_or_default()
    }

    /// The registry with the greatest priority; the earliest one wins ties.
    pub fn highest_priority<'a, I>(registries: I) -> Option<&'a ServiceRegistry>
    where
        I: IntoIterator<Item = &'a ServiceRegistry>,
    {
        registries.into_iter().fold(None, |best, candidate| match best {
            Some(b) if b.priority >= candidate.priority => Some(b),
            _ => Some(candidate),
        })
    }

    fn cell(&self, key: TypeId) -> Arc<OnceLock<ErasedService>> {
        let existing = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned();
        match existing {
            Some(cell) => cell,
            None => self
                .cache
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .entry(key)
                .or_default()
                .clone(),
        }
    }

    fn load<T>(&self, key: TypeId) -> Vec<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let mut services = Vec::new();
        for loader in self.loaders.get(&key).into_iter().flatten() {
            match (loader.load)() {
                Ok(erased) => match erased.downcast::<Arc<T>>() {
                    Ok(service) => services.push(*service),
                    Err(_) => warn!(
                        service = type_name::<T>(),
                        provider = %loader.name,
                        "provider returned a different service type"
                    ),
                },
                Err(e) => warn!(
                    service = type_name::<T>(),
                    provider = %loader.name,
                    error = %e,
                    "failed to load provider"
                ),
            }
        }
        debug!(service = type_name::<T>(), count = services.len(), "loaded services");
        services
    }
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("priority", &self.priority)
            .field("service_types", &self.loaders.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    struct English;
    impl Greeter for English {
        fn greet(&self) -> String {
            "hello".to_string()
        }
    }

    struct Italian;
    impl Greeter for Italian {
        fn greet(&self) -> String {
            "ciao".to_string()
        }
    }

    #[test]
    fn test_services_in_registration_order() {
        let registry = ServiceRegistry::new()
            .with_provider::<dyn Greeter, _>("en", || Ok(Arc::new(English)))
            .with_provider::<dyn Greeter, _>("it", || Ok(Arc::new(Italian)));

        let greetings: Vec<String> = registry
            .get_services::<dyn Greeter>()
            .iter()
            .map(|g| g.greet())
            .collect();
        assert_eq!(greetings, vec!["hello", "ciao"]);
        assert_eq!(registry.get_service::<dyn Greeter>().unwrap().greet(), "hello");
    }

    #[test]
    fn test_failed_provider_is_skipped() {
        let registry = ServiceRegistry::new()
            .with_provider::<dyn Greeter, _>("broken", || {
                Err(ProviderError::load_failed("broken", "missing resource"))
            })
            .with_provider::<dyn Greeter, _>("it", || Ok(Arc::new(Italian)));

        let services = registry.get_services::<dyn Greeter>();
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].greet(), "ciao");
    }

    #[test]
    fn test_unknown_service_type() {
        let registry = ServiceRegistry::new();
        assert!(registry.get_services::<dyn Greeter>().is_empty());
        assert!(registry.get_service::<dyn Greeter>().is_none());
        assert!(matches!(
            registry.require_service::<dyn Greeter>(),
            Err(ProviderError::Unavailable(_))
        ));
    }

    #[test]
    fn test_loaders_run_once_under_concurrent_lookups() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let registry = ServiceRegistry::new().with_provider::<dyn Greeter, _>("en", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(English))
        });

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..50 {
                        assert_eq!(registry.get_services::<dyn Greeter>().len(), 1);
                    }
                });
            }
        });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cached_instances_are_shared() {
        let registry = ServiceRegistry::new()
            .with_provider::<dyn Greeter, _>("en", || Ok(Arc::new(English)));
        let a = registry.get_service::<dyn Greeter>().unwrap();
        let b = registry.get_service::<dyn Greeter>().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_highest_priority() {
        let low = ServiceRegistry::new().with_priority(1);
        let default = ServiceRegistry::new();
        let high = ServiceRegistry::new().with_priority(20);
        let tie = ServiceRegistry::new().with_priority(20);

        let best = ServiceRegistry::highest_priority([&low, &default, &high, &tie]).unwrap();
        assert!(std::ptr::eq(best, &high));
        assert_eq!(default.priority(), DEFAULT_PRIORITY);
        assert!(ServiceRegistry::highest_priority(std::iter::empty()).is_none());
    }

    #[test]
    fn test_provider_names() {
        let registry = ServiceRegistry::new()
            .with_service::<dyn Greeter>("en", Arc::new(English))
            .with_provider::<dyn Greeter, _>("it", || Ok(Arc::new(Italian)));
        assert_eq!(registry.provider_names::<dyn Greeter>(), vec!["en", "it"]);
    }
}
