use thiserror::Error;

/// Failures reported by a surface or the driver layer behind it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurfaceError {
    #[error("surface is no longer attached to its document")]
    Detached,
    #[error("no such element: {0}")]
    NoSuchElement(String),
    #[error("no such frame: {0}")]
    NoSuchFrame(String),
    #[error("no element is focused in the current context")]
    NoActiveElement,
}

/// Failures of a typing call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    /// Unresolvable key name. Raised before any event is dispatched.
    #[error("unknown key: {0}")]
    UnknownKey(String),
    /// Absent or malformed input. Raised before any event is dispatched.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The surface went away mid-sequence. Events already applied stand.
    #[error("surface detached while typing {key}")]
    SurfaceDetached { key: String },
    #[error(transparent)]
    Surface(#[from] SurfaceError),
}
