//! Encoder error implementation.

use thiserror::Error;

/// Errors produced while encoding a token stream.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EncodeError {
    /// A command opcode outside the mnemonic table cannot be written in
    /// text form (nor, beyond the signed 32-bit range, in binary form).
    /// The separator state has already advanced when this is detected, so
    /// the stream is invalid; discard the buffer.
    #[error("no encodable form for command opcode {0:#x}")]
    UnknownOpcode(u32),
    /// A string or data payload longer than the wire length field can
    /// carry.
    #[error("payload of {0} bytes exceeds the wire length range")]
    PayloadTooLong(usize),
}

/// Result alias for writer operations.
pub type Result<T, E = EncodeError> = core::result::Result<T, E>;
