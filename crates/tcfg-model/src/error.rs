use thiserror::Error;

/// A malformed configuration path.
///
/// Paths come from the knowledge base, heuristic suggestions and callers; a
/// bad one is a programming error and is reported before any traversal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidPathError {
    #[error("configuration path is empty")]
    Empty,
    #[error("configuration path `{path}` has an empty segment")]
    EmptySegment { path: String },
    #[error("`{segment}` is not a valid path segment")]
    InvalidSegment { segment: String },
    #[error("section `{section}` can only be replaced by an object")]
    SectionRoot { section: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("invalid tenant id: {0:?}")]
    InvalidTenantId(String),
    #[error(transparent)]
    InvalidPath(#[from] InvalidPathError),
}
