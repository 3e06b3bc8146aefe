use bfm_asm::{base64, escape, varint, Opcode, Token};
use bfm_asm::{
    MAGIC_NAME, MAGIC_VARIANT, MAGIC_VERSION, TYPE_DATA, TYPE_GROUP_BEGIN, TYPE_GROUP_END,
    TYPE_INTEGER, TYPE_STRING,
};
use bfm_buffer::{BufferOptions, ByteBuffer};
use bitflags::bitflags;
use tracing::trace;

use crate::error::{EncodeError, Result};

bitflags! {
    /// Progress flags of the emission state machine.
    struct WriterFlags: u8 {
        /// The magic prelude precedes everything else in the buffer.
        const MAGIC_WRITTEN = 1 << 0;
        /// The previous token was an argument.
        const ARG_WRITTEN = 1 << 1;
        /// A command (or group opener) is awaiting its arguments.
        const CMD_WRITTEN = 1 << 2;
    }
}

/// Output variant selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Format {
    /// Compact varint records.
    #[default]
    Binary,
    /// Human-readable text tokens.
    Text,
}

/// Streaming BFM token writer.
///
/// Tokens go in through [`put_token`](Writer::put_token); encoded bytes
/// accumulate in an owned [`ByteBuffer`]. The first token triggers the
/// magic prelude (`[:bfm:blip:1` in text form), after which the outer
/// group stays open for the caller's stream.
///
/// A failed `put_token` leaves the partially emitted token in place; there
/// is no rollback, so on error the whole buffer must be discarded.
#[derive(Debug)]
pub struct Writer {
    format: Format,
    flags: WriterFlags,
    buffer: ByteBuffer,
}

impl Writer {
    /// Create a writer producing the given output variant.
    pub fn new(format: Format) -> Self {
        trace!(?format, "bfm writer created");

        Writer {
            format,
            flags: WriterFlags::empty(),
            buffer: ByteBuffer::new(0, BufferOptions::empty()),
        }
    }

    /// The output variant this writer produces.
    pub const fn format(&self) -> Format {
        self.format
    }

    /// The buffer holding the encoded stream so far.
    pub const fn buffer(&self) -> &ByteBuffer {
        &self.buffer
    }

    /// Mutable access to the underlying buffer, e.g. to drain it.
    pub fn buffer_mut(&mut self) -> &mut ByteBuffer {
        &mut self.buffer
    }

    /// Consume the writer, handing out the buffer with the encoded stream.
    pub fn into_buffer(self) -> ByteBuffer {
        self.buffer
    }

    /// Append one token to the stream.
    pub fn put_token(&mut self, token: &Token<'_>) -> Result<()> {
        if !self.flags.contains(WriterFlags::MAGIC_WRITTEN) {
            self.flags.insert(WriterFlags::MAGIC_WRITTEN);
            self.put_magic()?;
        }

        let open = WriterFlags::ARG_WRITTEN | WriterFlags::CMD_WRITTEN;

        if token.is_argument() {
            if self.flags.intersects(open) {
                self.write_arg_separator();
            }
            self.flags.insert(WriterFlags::ARG_WRITTEN);
        } else if self.flags.intersects(open) {
            match token {
                // A closing bracket terminates the open command by itself.
                Token::GroupEnd | Token::End => self.flags.remove(open),
                _ => self.write_command_end(),
            }
        }

        match *token {
            Token::GroupBegin => {
                self.flags.insert(WriterFlags::CMD_WRITTEN);
                self.put_group_begin();
                Ok(())
            }
            Token::GroupEnd | Token::End => {
                self.put_group_end();
                Ok(())
            }
            Token::Integer(value) => {
                self.put_integer(value);
                Ok(())
            }
            Token::String(value) => self.put_string(value),
            Token::Data(value) => self.put_data(value),
            Token::Cmd(value) => {
                self.flags.insert(WriterFlags::CMD_WRITTEN);
                self.put_command(value)
            }
        }
    }

    /// Emit the stream prelude through the regular token path, with the
    /// guard flag already set so the recursion terminates. The opened
    /// group is intentionally left open.
    fn put_magic(&mut self) -> Result<()> {
        trace!("emitting magic prelude");

        self.put_token(&Token::GroupBegin)?;
        self.put_token(&Token::String(MAGIC_NAME))?;
        self.put_token(&Token::String(MAGIC_VARIANT))?;
        self.put_token(&Token::Integer(MAGIC_VERSION))
    }

    fn write_arg_separator(&mut self) {
        self.flags.remove(WriterFlags::ARG_WRITTEN);

        if self.format == Format::Text {
            self.buffer.write_byte(b':');
        }
    }

    fn write_command_end(&mut self) {
        self.flags
            .remove(WriterFlags::ARG_WRITTEN | WriterFlags::CMD_WRITTEN);

        if self.format == Format::Text {
            self.buffer.write_byte(b';');
        }
    }

    fn write_varint(&mut self, value: i32) {
        let mut bytes = [0; varint::MAX_LEN];
        let len = varint::encode(value, &mut bytes);
        self.buffer.write_bytes(&bytes[..len]);
    }

    /// Structural type codes all fit comfortably in the signed varint
    /// domain.
    fn write_type_code(&mut self, code: u32) {
        self.write_varint(code as i32);
    }

    fn write_length(&mut self, len: usize) -> Result<()> {
        let len = i32::try_from(len).map_err(|_| EncodeError::PayloadTooLong(len))?;
        self.write_varint(len);
        Ok(())
    }

    fn put_group_begin(&mut self) {
        match self.format {
            Format::Binary => self.write_type_code(TYPE_GROUP_BEGIN),
            Format::Text => self.buffer.write_byte(b'['),
        }
    }

    fn put_group_end(&mut self) {
        match self.format {
            Format::Binary => self.write_type_code(TYPE_GROUP_END),
            Format::Text => self.buffer.write_byte(b']'),
        }
    }

    fn put_integer(&mut self, value: i32) {
        match self.format {
            Format::Binary => {
                self.write_type_code(TYPE_INTEGER);
                self.write_varint(value);
            }
            Format::Text => {
                self.buffer.write_bytes(value.to_string().as_bytes());
            }
        }
    }

    fn put_string(&mut self, value: &[u8]) -> Result<()> {
        match self.format {
            Format::Binary => {
                self.write_type_code(TYPE_STRING);
                self.write_length(value.len())?;
                self.buffer.write_bytes(value);
            }
            Format::Text => {
                self.buffer.write_bytes(&escape::escape(value));
            }
        }

        Ok(())
    }

    fn put_data(&mut self, value: &[u8]) -> Result<()> {
        match self.format {
            Format::Binary => {
                self.write_type_code(TYPE_DATA);
                self.write_length(value.len())?;
                self.buffer.write_bytes(value);
            }
            Format::Text => {
                self.buffer.write_byte(b'!');
                self.buffer.write_bytes(&base64::encode(value));
            }
        }

        Ok(())
    }

    fn put_command(&mut self, value: u32) -> Result<()> {
        match self.format {
            Format::Binary => {
                let code = i32::try_from(value).map_err(|_| EncodeError::UnknownOpcode(value))?;
                self.write_varint(code);
            }
            Format::Text => {
                let opcode =
                    Opcode::from_value(value).ok_or(EncodeError::UnknownOpcode(value))?;
                self.buffer.write_bytes(opcode.mnemonic().as_bytes());
            }
        }

        Ok(())
    }
}

impl Default for Writer {
    fn default() -> Self {
        Writer::new(Format::Binary)
    }
}
