//! # rf-construct
//!
//! Constructs translate an algorithm's directive file into a parameter space.
//! The [`ConstructRegistry`] maps the construct type named in a registry
//! directive to the factory that loads and builds it.

mod construct;
mod ppo;
mod registry;

pub use construct::{
    CommittedConstruct, Construct, ConstructFactory, ConstructRegistryDirective, SectionResult,
};
pub use ppo::PpoConstruct;
pub use registry::{ConstructRegistry, ConstructRegistryBuilder};
