pub mod directive;
pub mod errors;
pub mod job;
pub mod loader;

pub use directive::*;
pub use errors::*;
pub use job::*;
pub use loader::*;
