//! Lookup table from construct-type keys to construct factories.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use tracing::debug;

use rf_types::{RfError, RfResult};

use crate::construct::{Construct, ConstructFactory, ConstructRegistryDirective};
use crate::ppo::PpoConstruct;

/// Process-wide registry, populated on first access and read-only afterwards.
static GLOBAL_REGISTRY: Lazy<ConstructRegistry> = Lazy::new(|| {
    ConstructRegistry::builder()
        .register(PpoConstruct::CONSTRUCT_TYPE, PpoConstruct::factory)
        .build()
});

/// Immutable mapping of construct type to factory.
#[derive(Clone)]
pub struct ConstructRegistry {
    factories: HashMap<String, ConstructFactory>,
}

impl ConstructRegistry {
    pub fn global() -> &'static ConstructRegistry {
        &GLOBAL_REGISTRY
    }

    pub fn builder() -> ConstructRegistryBuilder {
        ConstructRegistryBuilder::default()
    }

    pub fn resolve(&self, construct_type: &str) -> RfResult<ConstructFactory> {
        self.factories
            .get(construct_type)
            .copied()
            .ok_or_else(|| RfError::UnknownConstruct {
                construct_type: construct_type.to_string(),
            })
    }

    /// Resolve the directive's construct type, then let its factory load the
    /// construct file from `trainable_dir`.
    pub fn build(
        &self,
        directive: &ConstructRegistryDirective,
        trainable_dir: &Path,
    ) -> RfResult<Box<dyn Construct>> {
        let factory = self.resolve(&directive.construct_type)?;
        debug!("Resolved construct type '{}'", directive.construct_type);
        factory(directive, trainable_dir)
    }

    pub fn contains(&self, construct_type: &str) -> bool {
        self.factories.contains_key(construct_type)
    }

    /// Registered construct types, sorted.
    pub fn construct_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }
}

/// Collects registrations; the registry it builds cannot be changed.
#[derive(Default)]
pub struct ConstructRegistryBuilder {
    factories: HashMap<String, ConstructFactory>,
}

impl ConstructRegistryBuilder {
    pub fn register(mut self, construct_type: impl Into<String>, factory: ConstructFactory) -> Self {
        self.factories.insert(construct_type.into(), factory);
        self
    }

    pub fn build(self) -> ConstructRegistry {
        ConstructRegistry {
            factories: self.factories,
        }
    }
}

impl fmt::Debug for ConstructRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructRegistry")
            .field("construct_types", &self.construct_types())
            .finish()
    }
}

impl fmt::Debug for ConstructRegistryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructRegistryBuilder")
            .field("registered", &self.factories.len())
            .finish()
    }
}
