//! Error types for the GfxEngine frame core
//!
//! Two classes of failure are reported here:
//! - setup failures (shader compilation, missing native type mapping, unimplemented
//!   pipeline toggles) which abort resource creation or the draw that hit them
//! - caller contract violations (vertex spans that do not match the material stride,
//!   geometry recorded with an incompatible layout) which are rejected before any
//!   buffer is touched

use std::fmt;
use crate::material::ShaderFieldType;

/// Result type for GfxEngine operations
pub type Result<T> = std::result::Result<T, Error>;

/// GfxEngine errors
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Backend-specific error
    BackendError(String),

    /// Initialization failed (graphics, device, subsystems)
    InitializationFailed(String),

    /// Invalid resource usage (unset uniform, type mismatch, bad layout)
    InvalidResource(String),

    /// Shader compilation or program link failure
    ShaderCompilation(String),

    /// A shader field type has no native mapping in the active backend
    UnsupportedFieldType {
        field: String,
        field_type: ShaderFieldType,
    },

    /// Feature or pipeline toggle the backend does not implement
    Unsupported(String),

    /// Vertex byte length is not a multiple of the material attribute stride
    InvalidVertexData {
        byte_len: usize,
        stride: usize,
    },

    /// Geometry recorded with one attribute layout merged into another
    IncompatibleLayout(String),

    /// A vertex count or rebased index does not fit in 32 bits
    IndexOverflow,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::ShaderCompilation(msg) => write!(f, "Shader compilation failed: {}", msg),
            Error::UnsupportedFieldType { field, field_type } => {
                write!(f, "Unsupported field type {:?} for field '{}'", field_type, field)
            }
            Error::Unsupported(msg) => write!(f, "Unsupported: {}", msg),
            Error::InvalidVertexData { byte_len, stride } => write!(
                f,
                "Invalid vertex data: {} bytes is not a multiple of the {}-byte stride",
                byte_len, stride
            ),
            Error::IncompatibleLayout(msg) => write!(f, "Incompatible layout: {}", msg),
            Error::IndexOverflow => write!(f, "Index overflow: vertex count exceeds u32 range"),
        }
    }
}

impl std::error::Error for Error {}

/// Log an error with file:line information and build an `Error::BackendError`
///
/// # Example
///
/// ```no_run
/// # use gfx_engine::engine_err;
/// let err = engine_err!("gfx::Graphics", "Texture unit {} out of range", 7);
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::gfx::Engine::log_detailed(
            $crate::gfx::log::LogSeverity::Error,
            $source,
            message.clone(),
            file!(),
            line!()
        );
        $crate::gfx::Error::BackendError(message)
    }};
}

/// Log an error and return it from the enclosing function
///
/// # Example
///
/// ```no_run
/// # use gfx_engine::engine_bail;
/// fn check(units: u32) -> gfx_engine::gfx::Result<()> {
///     if units == 0 {
///         engine_bail!("gfx::Graphics", "At least one texture unit is required");
///     }
///     Ok(())
/// }
/// ```
#[macro_export]
macro_rules! engine_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_err!($source, $($arg)*))
    };
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
