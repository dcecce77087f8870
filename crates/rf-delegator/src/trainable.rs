//! Trainable-level delegation: one construct, committed once.

use once_cell::unsync::OnceCell;
use std::path::Path;
use tracing::info;

use rf_construct::{CommittedConstruct, Construct, ConstructRegistry, ConstructRegistryDirective};
use rf_types::{ParameterSpace, RfResult};

/// Resolves a construct through the registry and caches its commit.
///
/// The commit happens at most once per delegator; a fresh delegator is the
/// only way to re-resolve.
#[derive(Debug)]
pub struct TrainableConstructDelegator {
    directive: ConstructRegistryDirective,
    construct: Box<dyn Construct>,
    committed: OnceCell<CommittedConstruct>,
}

impl TrainableConstructDelegator {
    /// Build through the process-wide registry.
    pub fn from_construct_directive(
        directive: ConstructRegistryDirective,
        trainable_dir: &Path,
    ) -> RfResult<Self> {
        Self::with_registry(ConstructRegistry::global(), directive, trainable_dir)
    }

    pub fn with_registry(
        registry: &ConstructRegistry,
        directive: ConstructRegistryDirective,
        trainable_dir: &Path,
    ) -> RfResult<Self> {
        let construct = registry.build(&directive, trainable_dir)?;
        info!(
            "Delegating trainable to '{}' construct ({})",
            construct.construct_type(),
            directive.path_to_construct_file.display()
        );
        Ok(Self::from_construct(directive, construct))
    }

    /// Wrap an already built construct.
    pub fn from_construct(directive: ConstructRegistryDirective, construct: Box<dyn Construct>) -> Self {
        Self {
            directive,
            construct,
            committed: OnceCell::new(),
        }
    }

    /// Parameter space of the construct, committing it on first call.
    pub fn delegate(&self) -> RfResult<&ParameterSpace> {
        Ok(&self.committed()?.param_space)
    }

    /// Trainable target identifier, available once [`delegate`](Self::delegate)
    /// has succeeded.
    pub fn target(&self) -> Option<&str> {
        self.committed.get().map(|c| c.target.as_str())
    }

    pub fn algorithm(&self) -> &'static str {
        self.construct.algorithm()
    }

    /// Consume the delegator, returning the (possibly cached) commit.
    pub fn into_committed(self) -> RfResult<CommittedConstruct> {
        match self.committed.into_inner() {
            Some(committed) => Ok(committed),
            None => self.construct.commit(),
        }
    }

    fn committed(&self) -> RfResult<&CommittedConstruct> {
        self.committed.get_or_try_init(|| {
            let committed = self.construct.commit()?;
            info!(
                "Committed {} parameter sections for trainable {} from {}",
                committed.param_space.len(),
                committed.target,
                self.directive.path_to_construct_file.display()
            );
            Ok(committed)
        })
    }
}
