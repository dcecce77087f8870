//! The construct contract: pluggable translators from a directive subtree to
//! a framework-ready parameter space.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};

use rf_types::{unwrap_envelope, DirectiveNode, ParameterSection, ParameterSpace, RfError, RfResult};

/// Outcome of resolving one parameter section.
pub type SectionResult = RfResult<(ParameterSection, Map<String, Value>)>;

/// Builds a loaded construct from its registry directive. `trainable_dir` is
/// the directory `path_to_construct_file` is relative to.
pub type ConstructFactory =
    fn(&ConstructRegistryDirective, &Path) -> RfResult<Box<dyn Construct>>;

/// Which construct to instantiate and where its own directive file lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructRegistryDirective {
    pub construct_type: String,
    pub path_to_construct_file: PathBuf,
}

impl ConstructRegistryDirective {
    pub const PATH_KEY: &'static str = "path_to_construct_file";

    pub fn new(construct_type: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            construct_type: construct_type.into(),
            path_to_construct_file: path.into(),
        }
    }

    /// Read `{ choice: <type>, path_to_construct_file: <path> }`.
    pub fn from_directive(node: &DirectiveNode<'_>) -> RfResult<Self> {
        let choice = unwrap_envelope(node.as_value(), node.path())?;
        let construct_type = choice
            .as_str()
            .ok_or_else(|| RfError::InvalidValue {
                path: node.path().to_string(),
                message: format!("construct type must be a string, found {choice}"),
            })?
            .to_string();
        let path = node.plain_str(Self::PATH_KEY)?;

        Ok(Self::new(construct_type, path))
    }

    /// Absolute (or cwd-relative) location of the construct file.
    pub fn construct_file(&self, trainable_dir: &Path) -> PathBuf {
        trainable_dir.join(&self.path_to_construct_file)
    }
}

/// Result of committing a construct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommittedConstruct {
    /// Trainable target identifier.
    pub target: String,
    /// Algorithm the external engine should run, e.g. `PPO`.
    pub algorithm: String,
    pub param_space: ParameterSpace,
}

/// A translator from one directive subtree to a parameter space.
pub trait Construct: Send + Sync + fmt::Debug {
    /// Registry key this construct is registered under.
    fn construct_type(&self) -> &'static str;

    fn algorithm(&self) -> &'static str;

    /// Whether the construct's directive file has been loaded.
    fn is_loaded(&self) -> bool;

    /// Resolve every mandatory section independently.
    ///
    /// The outer result fails only when the construct is not loaded; each
    /// inner result carries that section's first missing key.
    fn resolve_sections(&self) -> RfResult<Vec<SectionResult>>;

    /// Trainable target identifier.
    fn target(&self) -> RfResult<String>;

    /// Resolve all sections and merge them into one parameter space.
    fn commit(&self) -> RfResult<CommittedConstruct> {
        let mut resolved = Vec::new();
        let mut errors = Vec::new();
        for section in self.resolve_sections()? {
            match section {
                Ok(entry) => resolved.push(entry),
                Err(e) => errors.push(e),
            }
        }
        if let Some(err) = RfError::from_sections(errors) {
            return Err(err);
        }

        Ok(CommittedConstruct {
            target: self.target()?,
            algorithm: self.algorithm().to_string(),
            param_space: ParameterSpace::from_sections(resolved),
        })
    }
}
