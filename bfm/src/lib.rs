//! BFM token writer.
//!
//! Serializes a stream of tracker tokens (group delimiters, commands and
//! their arguments) into either the compact binary variant or the
//! human-readable text variant of the Blip File Module format. Both
//! variants share one emission path: a small state machine interleaves the
//! format's separators and lazily prefixes the stream with its magic
//! prelude.
//!
//! ```
//! use bfm::{Format, Opcode, Token, Writer};
//!
//! let mut writer = Writer::new(Format::Text);
//! writer.put_token(&Token::from(Opcode::Volume))?;
//! writer.put_token(&Token::Integer(255))?;
//! writer.put_token(&Token::GroupEnd)?;
//!
//! let mut buffer = writer.into_buffer();
//! let mut out = vec![0; buffer.len()];
//! buffer.read_bytes(&mut out).expect("owned buffers have no source");
//! assert_eq!(out, b"[:bfm:blip:1;v:255]");
//! # Ok::<(), bfm::EncodeError>(())
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(unused_must_use)]

mod error;
mod writer;

pub use error::{EncodeError, Result};
pub use writer::{Format, Writer};

pub use bfm_asm::{Opcode, Token};
pub use bfm_buffer::ByteBuffer;
