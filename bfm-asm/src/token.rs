use crate::Opcode;

/// Wire type code of a group-begin record.
pub const TYPE_GROUP_BEGIN: u32 = 0x01;
/// Wire type code of a group-end record.
pub const TYPE_GROUP_END: u32 = 0x02;
/// Wire type code of a signed integer record.
pub const TYPE_INTEGER: u32 = 0x03;
/// Wire type code of a length-prefixed string record.
pub const TYPE_STRING: u32 = 0x04;
/// Wire type code of a length-prefixed data record.
pub const TYPE_DATA: u32 = 0x05;

/// Lowest value available to command opcodes. Everything below is reserved
/// for the structural type codes.
pub const COMMAND_BASE: u32 = 0x10;

/// First magic string of the stream prelude.
pub const MAGIC_NAME: &[u8] = b"bfm";
/// Second magic string of the stream prelude.
pub const MAGIC_VARIANT: &[u8] = b"blip";
/// Format version carried by the stream prelude.
pub const MAGIC_VERSION: i32 = 1;

/// A single element of a BFM token stream.
///
/// String and data payloads are borrowed; the writer copies them into its
/// buffer, so tokens are cheap throwaway values. Command tokens carry a raw
/// opcode value; [`Opcode`] converts into the matching `Cmd` token, and is
/// the intended construction path:
///
/// ```
/// use bfm_asm::{Opcode, Token};
///
/// let token = Token::from(Opcode::Attack);
/// assert_eq!(token, Token::Cmd(Opcode::Attack as u32));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// Opens a group (`[` in text form).
    GroupBegin,
    /// Closes a group (`]` in text form).
    GroupEnd,
    /// Terminates the stream; shares the group-end wire representation.
    End,
    /// A signed integer argument.
    Integer(i32),
    /// A string argument. Raw bytes in binary form; delimiters are escaped
    /// in text form.
    String(&'a [u8]),
    /// An opaque binary argument. Base64-encoded in text form.
    Data(&'a [u8]),
    /// A command opcode. Binary form accepts any value; text form requires
    /// an entry in the mnemonic table.
    Cmd(u32),
}

impl Token<'_> {
    /// Whether this token is an argument to the preceding command, rather
    /// than a command or group delimiter itself.
    pub const fn is_argument(&self) -> bool {
        matches!(self, Token::Integer(_) | Token::String(_) | Token::Data(_))
    }
}

impl From<Opcode> for Token<'_> {
    fn from(opcode: Opcode) -> Self {
        Token::Cmd(opcode as u32)
    }
}
