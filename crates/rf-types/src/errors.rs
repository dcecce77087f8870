use thiserror::Error;

/// Main error type for the RolloutForge system
#[derive(Error, Debug)]
pub enum RfError {
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    #[error("Configuration parse error in {path}: {message}")]
    ConfigParse { path: String, message: String },

    #[error("Missing directive section: {section}")]
    MissingSection { section: String },

    #[error("Directive '{path}' has no 'choice' envelope")]
    MissingChoice { path: String },

    #[error("Invalid value for directive '{path}': {message}")]
    InvalidValue { path: String, message: String },

    #[error("Unknown construct type: {construct_type}")]
    UnknownConstruct { construct_type: String },

    #[error("Construct '{construct}' committed before its directive file was loaded")]
    NotInitialized { construct: String },

    #[error("{} directive sections failed to resolve: {}", .0.len(), join_errors(.0))]
    Sections(Vec<RfError>),

    #[error("Execution runtime error: {message}")]
    Runtime { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RfError {
    /// Collapse per-section failures: a single failure is returned as-is so
    /// callers can still match on it.
    pub fn from_sections(mut errors: Vec<RfError>) -> Option<RfError> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(RfError::Sections(errors)),
        }
    }

    /// The directive path this error points at, if any.
    pub fn directive_path(&self) -> Option<&str> {
        match self {
            RfError::MissingSection { section } => Some(section),
            RfError::MissingChoice { path } | RfError::InvalidValue { path, .. } => Some(path),
            _ => None,
        }
    }
}

fn join_errors(errors: &[RfError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias for RolloutForge operations
pub type RfResult<T> = Result<T, RfError>;

/// Macro for creating runtime errors
#[macro_export]
macro_rules! runtime_error {
    ($($arg:tt)*) => {
        $crate::RfError::Runtime { message: format!($($arg)*) }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = RfError::MissingSection {
            section: "ppo-directive.resources".to_string(),
        };
        assert!(error.to_string().contains("ppo-directive.resources"));

        let error = RfError::UnknownConstruct {
            construct_type: "dqn".to_string(),
        };
        assert_eq!(error.to_string(), "Unknown construct type: dqn");
    }

    #[test]
    fn test_single_section_error_is_not_wrapped() {
        let err = RfError::from_sections(vec![RfError::MissingChoice {
            path: "ppo-directive.training.lr".into(),
        }])
        .unwrap();

        match err {
            RfError::MissingChoice { path } => assert_eq!(path, "ppo-directive.training.lr"),
            other => panic!("Expected MissingChoice, got {other:?}"),
        }
        assert!(RfError::from_sections(Vec::new()).is_none());
    }

    #[test]
    fn test_multiple_section_errors_are_aggregated() {
        let err = RfError::from_sections(vec![
            RfError::MissingSection { section: "ppo-directive.training".into() },
            RfError::MissingSection { section: "ppo-directive.resources".into() },
        ])
        .unwrap();

        let message = err.to_string();
        assert!(message.starts_with("2 directive sections"));
        assert!(message.contains("ppo-directive.training"));
        assert!(message.contains("ppo-directive.resources"));
    }

    #[test]
    fn test_macros() {
        let err = runtime_error!("spool directory {} is not writable", "/tmp/x");
        assert!(matches!(err, RfError::Runtime { .. }));
        assert!(err.to_string().contains("/tmp/x"));
    }
}
