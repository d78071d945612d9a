use std::fmt;

use thiserror::Error;

use crate::validation::ValidationIssue;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("App '{0}' not found")]
    AppNotFound(String),

    #[error("Store index not found at '{0}'")]
    IndexNotFound(String),

    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("HTTP {status} from {url}: {message}")]
    HttpStatus {
        status: u16,
        url: String,
        message: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("IO operation '{operation}' failed on path '{path}': {source}")]
    IoOperation {
        operation: String,
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Archive error: {0}")]
    ArchiveError(#[from] zip::result::ZipError),

    #[error("Archive entry '{path}' could not be encoded: {source}")]
    ArchiveSerialization {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid base64 content for '{path}': {source}")]
    InvalidEncoding {
        path: String,
        source: base64::DecodeError,
    },

    #[error("Empty file content received for '{0}'")]
    EmptyContent(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    pub fn is_recoverable(&self) -> bool {
        match self {
            StoreError::NetworkError(_) => true,
            StoreError::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            StoreError::AppNotFound(_)
                | StoreError::InvalidManifest(_)
                | StoreError::PermissionDenied(_)
                | StoreError::InvalidConfiguration(_)
                | StoreError::InvalidPath(_)
                | StoreError::EmptyContent(_)
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::AppNotFound(_) | StoreError::IndexNotFound(_)
        ) || matches!(self, StoreError::HttpStatus { status: 404, .. })
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::NetworkError(err.to_string())
    }
}

/// The dispatch step a publish was at when a backend call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishStep {
    ReadIndex,
    Package,
    Icon,
    Screenshot(usize),
    FullManifest,
    StoreIndex,
}

impl fmt::Display for PublishStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishStep::ReadIndex => write!(f, "read store index"),
            PublishStep::Package => write!(f, "upload package"),
            PublishStep::Icon => write!(f, "upload icon"),
            PublishStep::Screenshot(i) => write!(f, "upload screenshot {}", i),
            PublishStep::FullManifest => write!(f, "save full manifest"),
            PublishStep::StoreIndex => write!(f, "update store index"),
        }
    }
}

/// Why a publish attempt was abandoned.
///
/// Validation and duplicate-identity failures happen before anything is
/// written. Backend failures leave earlier steps in place: there is no
/// rollback, so the operator retries or reconciles by hand.
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Validation failed: {}", describe_issues(.0))]
    ValidationFailed(Vec<ValidationIssue>),

    #[error("App ID '{0}' is already taken")]
    DuplicateIdentity(String),

    #[error("Packaging failed: {0}")]
    PackagingFailed(#[source] StoreError),

    #[error("Publishing failed at step '{step}': {source}")]
    BackendWriteFailed {
        step: PublishStep,
        #[source]
        source: StoreError,
    },

    #[error("App '{0}' not found")]
    NotFound(String),
}

impl PublishError {
    /// Failures the operator fixes by changing the form, the target or the token.
    pub fn is_user_error(&self) -> bool {
        match self {
            PublishError::ValidationFailed(_)
            | PublishError::DuplicateIdentity(_)
            | PublishError::NotFound(_) => true,
            PublishError::PackagingFailed(source)
            | PublishError::BackendWriteFailed { source, .. } => source.is_user_error(),
        }
    }

    /// Backend failures worth retrying unchanged.
    pub fn is_retryable(&self) -> bool {
        match self {
            PublishError::BackendWriteFailed { source, .. } => source.is_recoverable(),
            _ => false,
        }
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        match self {
            PublishError::ValidationFailed(issues) => issues,
            _ => &[],
        }
    }
}

fn describe_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(|issue| issue.description.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
