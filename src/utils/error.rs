use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlanError {
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid document: {message}")]
    InvalidDocumentError { message: String },

    #[error("Missing required field '{field}' in {section} entry '{name}'")]
    MissingFieldError {
        section: String,
        name: String,
        field: String,
    },

    #[error("Invalid field '{field}' in {section} entry '{name}': {reason}")]
    InvalidFieldError {
        section: String,
        name: String,
        field: String,
        reason: String,
    },

    #[error("Malformed constraint on parameter '{parameter}': {reason}")]
    MalformedConstraintError { parameter: String, reason: String },

    #[error("{kind} not found: {name}")]
    NotFoundError { kind: String, name: String },

    #[error("Duplicate {kind}: {name}")]
    DuplicateError { kind: String, name: String },

    #[error("Ambiguous match for '{name}': {}", .candidates.join(", "))]
    AmbiguousMatchError {
        name: String,
        candidates: Vec<String>,
    },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid configuration value for {field} ('{value}'): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

impl PlanError {
    pub(crate) fn not_found(kind: &str, name: &str) -> Self {
        PlanError::NotFoundError {
            kind: kind.to_string(),
            name: name.to_string(),
        }
    }

    pub(crate) fn duplicate(kind: &str, name: &str) -> Self {
        PlanError::DuplicateError {
            kind: kind.to_string(),
            name: name.to_string(),
        }
    }

    /// 是否為輸入資料本身的問題 (相對於 IO 或設定錯誤)
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            PlanError::YamlError(_)
                | PlanError::InvalidDocumentError { .. }
                | PlanError::MissingFieldError { .. }
                | PlanError::InvalidFieldError { .. }
                | PlanError::MalformedConstraintError { .. }
                | PlanError::AmbiguousMatchError { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, PlanError>;
