//! Quanta Provider Registry
//!
//! Pluggable services (unit formats, unit systems) are registered as factory
//! closures keyed by their service type and loaded on first lookup:
//! - `ServiceRegistry`: builder plus lazily populated per-type cache
//! - `ProviderError`: why a provider could not be loaded

mod error;
mod registry;

pub use error::ProviderError;
pub use registry::{ServiceRegistry, DEFAULT_PRIORITY};

pub mod prelude {
    pub use crate::{ProviderError, ServiceRegistry};
}
