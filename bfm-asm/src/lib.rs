//! Token vocabulary and wire codecs of the BFM tracker intermediate format.
//!
//! A BFM stream is a flat sequence of typed tokens: group delimiters,
//! integers, strings, data blobs and command opcodes. This crate defines the
//! token model and the primitives both wire variants are built from: the
//! varint record codec of the binary form, and the base64 and escaping rules
//! of the text form. The writer that drives these primitives lives in the
//! `bfm` crate.

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(unused_must_use)]

pub mod base64;
pub mod escape;
pub mod varint;

mod opcode;
mod token;

pub use opcode::Opcode;
pub use token::{
    Token, COMMAND_BASE, MAGIC_NAME, MAGIC_VARIANT, MAGIC_VERSION, TYPE_DATA, TYPE_GROUP_BEGIN,
    TYPE_GROUP_END, TYPE_INTEGER, TYPE_STRING,
};

#[cfg(test)]
mod encoding_tests;
