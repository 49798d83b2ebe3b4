use schemapack_core_types::{RequestId, TraceId};
use thiserror::Error;

/// Result type alias using SchemaPackError
pub type Result<T> = std::result::Result<T, SchemaPackError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code used for programmatic handling,
/// tests and tool-call responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Lookup
    NotFound,
    AlreadyExists,

    // Validation (upstream of install)
    InvalidInput,
    InvalidDefinition,
    CycleDetected,
    DuplicateId,
    DanglingReference,

    // Document
    TransactionAborted,
    Concurrency,

    // Integration/IO
    Io,
    Serialization,
    Persistence,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::AlreadyExists => "ERR_ALREADY_EXISTS",
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::InvalidDefinition => "ERR_INVALID_DEFINITION",
            ExErrorKind::CycleDetected => "ERR_CYCLE_DETECTED",
            ExErrorKind::DuplicateId => "ERR_DUPLICATE_ID",
            ExErrorKind::DanglingReference => "ERR_DANGLING_REFERENCE",
            ExErrorKind::TransactionAborted => "ERR_TRANSACTION_ABORTED",
            ExErrorKind::Concurrency => "ERR_CONCURRENCY",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries classification fields for programmatic handling and context for
/// debugging. The store and engine crates speak this type.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity_id: Option<String>,
    package_id: Option<String>,
    request_id: Option<RequestId>,
    trace_id: Option<TraceId>,
    message: String,
    candidates: Option<Vec<String>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_id: None,
            package_id: None,
            request_id: None,
            trace_id: None,
            message: String::new(),
            candidates: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity ID context
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    /// Add package ID context
    pub fn with_package_id(mut self, id: impl Into<String>) -> Self {
        self.package_id = Some(id.into());
        self
    }

    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add candidate ids (e.g. the groups a reference could resolve to)
    pub fn with_candidates(mut self, ids: Vec<String>) -> Self {
        self.candidates = Some(ids);
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    pub fn package_id(&self) -> Option<&str> {
        self.package_id.as_deref()
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    pub fn trace_id(&self) -> Option<&TraceId> {
        self.trace_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn candidates(&self) -> Option<&[String]> {
        self.candidates.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(package_id) = &self.package_id {
            write!(f, " (package_id: {})", package_id)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity_id: {})", entity_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Domain error taxonomy for schema package operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaPackError {
    // ===== Lookup =====
    /// No manifest entry: the package was never installed in this document
    #[error("Package is not loaded in this document: {package_id}")]
    ManifestEntryNotFound { package_id: String },

    /// No live package record
    #[error("Live package not found: {package_id}")]
    PackageNotFound { package_id: String },

    #[error("Library entry not found: {entry_id}")]
    LibraryEntryNotFound { entry_id: String },

    #[error("Library entry {entry_id} has no version {version}")]
    LibraryVersionNotFound { entry_id: String, version: u32 },

    /// Library entry exists but nothing has been published into it yet
    #[error("Library entry {entry_id} has no published versions")]
    LibraryEntryEmpty { entry_id: String },

    // ===== Document writes =====
    #[error("Manifest entry already exists for package {package_id}")]
    ManifestEntryExists { package_id: String },

    #[error("Live package already exists: {package_id}")]
    PackageAlreadyExists { package_id: String },

    #[error("Library entry already exists: {entry_id}")]
    LibraryEntryExists { entry_id: String },

    // ===== Validation =====
    #[error("Invalid definition {package_id}: {reason}")]
    InvalidDefinition { package_id: String, reason: String },

    #[error("Duplicate {kind} id in definition {package_id}: {id}")]
    DuplicateId {
        package_id: String,
        kind: String,
        id: String,
    },

    #[error("{kind} {owner} references unknown group {group_id}")]
    UnknownGroupReference {
        kind: String,
        owner: String,
        group_id: String,
    },

    #[error("Group parent cycle detected at group {group_id}")]
    GroupCycle { group_id: String },

    // ===== Generic =====
    #[error("Transaction aborted: {message}")]
    TransactionAborted { message: String },

    /// Serialization error (JSON encoding/decoding)
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Conversion from SchemaPackError to the canonical ExError
impl From<SchemaPackError> for ExError {
    fn from(err: SchemaPackError) -> Self {
        match err {
            SchemaPackError::ManifestEntryNotFound { package_id } => {
                ExError::new(ExErrorKind::NotFound)
                    .with_package_id(package_id)
                    .with_message("Package is not loaded (no manifest entry)")
            }

            SchemaPackError::PackageNotFound { package_id } => {
                ExError::new(ExErrorKind::NotFound)
                    .with_package_id(package_id)
                    .with_message("Live package not found")
            }

            SchemaPackError::LibraryEntryNotFound { entry_id } => {
                ExError::new(ExErrorKind::NotFound)
                    .with_entity_id(entry_id)
                    .with_message("Library entry not found")
            }

            SchemaPackError::LibraryVersionNotFound { entry_id, version } => {
                ExError::new(ExErrorKind::NotFound)
                    .with_entity_id(entry_id)
                    .with_message(format!("Library version {} not found", version))
            }

            SchemaPackError::LibraryEntryEmpty { entry_id } => ExError::new(ExErrorKind::NotFound)
                .with_entity_id(entry_id)
                .with_message("Library entry has no published versions"),

            SchemaPackError::ManifestEntryExists { package_id } => {
                ExError::new(ExErrorKind::AlreadyExists)
                    .with_package_id(package_id)
                    .with_message("Manifest entry already exists")
            }

            SchemaPackError::PackageAlreadyExists { package_id } => {
                ExError::new(ExErrorKind::AlreadyExists)
                    .with_package_id(package_id)
                    .with_message("Live package already exists")
            }

            SchemaPackError::LibraryEntryExists { entry_id } => {
                ExError::new(ExErrorKind::AlreadyExists)
                    .with_entity_id(entry_id)
                    .with_message("Library entry already exists")
            }

            SchemaPackError::InvalidDefinition { package_id, reason } => {
                ExError::new(ExErrorKind::InvalidDefinition)
                    .with_package_id(package_id)
                    .with_message(reason)
            }

            SchemaPackError::DuplicateId {
                package_id,
                kind,
                id,
            } => ExError::new(ExErrorKind::DuplicateId)
                .with_package_id(package_id)
                .with_entity_id(id)
                .with_message(format!("Duplicate {} id", kind)),

            SchemaPackError::UnknownGroupReference {
                kind,
                owner,
                group_id,
            } => ExError::new(ExErrorKind::DanglingReference)
                .with_entity_id(owner)
                .with_message(format!("{} references unknown group {}", kind, group_id)),

            SchemaPackError::GroupCycle { group_id } => ExError::new(ExErrorKind::CycleDetected)
                .with_entity_id(group_id)
                .with_message("Group parent chain forms a cycle"),

            SchemaPackError::TransactionAborted { message } => {
                ExError::new(ExErrorKind::TransactionAborted).with_message(message)
            }

            SchemaPackError::Serialization { message } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }

            SchemaPackError::Internal { message } => {
                ExError::new(ExErrorKind::Internal).with_message(message)
            }
        }
    }
}

/// Conversion from serde_json::Error to SchemaPackError
impl From<serde_json::Error> for SchemaPackError {
    fn from(err: serde_json::Error) -> Self {
        SchemaPackError::Serialization {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_codes() {
        let cases = [
            (ExErrorKind::NotFound, "ERR_NOT_FOUND"),
            (ExErrorKind::AlreadyExists, "ERR_ALREADY_EXISTS"),
            (ExErrorKind::InvalidDefinition, "ERR_INVALID_DEFINITION"),
            (ExErrorKind::Persistence, "ERR_PERSISTENCE"),
        ];
        for (kind, expected_code) in cases {
            assert_eq!(kind.code(), expected_code, "Wrong code for {:?}", kind);
        }
    }

    #[test]
    fn test_manifest_not_found_maps_to_not_found() {
        let err: ExError = SchemaPackError::ManifestEntryNotFound {
            package_id: "pkg-1".to_string(),
        }
        .into();
        assert_eq!(err.kind(), ExErrorKind::NotFound);
        assert_eq!(err.package_id(), Some("pkg-1"));
    }

    #[test]
    fn test_display_includes_code_and_context() {
        let err = ExError::new(ExErrorKind::NotFound)
            .with_op("check_drift")
            .with_package_id("pkg-1")
            .with_message("missing");
        let rendered = err.to_string();
        assert!(rendered.starts_with("[ERR_NOT_FOUND]"));
        assert!(rendered.contains("check_drift"));
        assert!(rendered.contains("pkg-1"));
    }

    #[test]
    fn test_candidates_none_by_default() {
        let err = ExError::new(ExErrorKind::NotFound);
        assert!(err.candidates().is_none());
    }
}
