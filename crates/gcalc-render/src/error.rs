//! Render error types.

/// Errors produced while packing a program for upload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    /// The texture width is outside `1..=MAX_TEXTURE_DIMENSION`.
    #[error("texture width must be between 1 and {max}, got {width}")]
    InvalidTextureWidth { width: usize, max: usize },

    /// The program needs more rows than a texture can hold.
    #[error("program of {len} instructions needs {height} rows, limit is {max}")]
    ProgramTooLarge { len: usize, height: usize, max: usize },

    /// More slots than a slot operand can address.
    #[error("too many program slots: {0}")]
    TooManySlots(usize),
}
