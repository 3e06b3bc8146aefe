use crate::*;
use strum::IntoEnumIterator;

#[test]
fn mnemonic_table_is_bijective() {
    for opcode in Opcode::iter() {
        assert_eq!(Opcode::from_mnemonic(opcode.mnemonic()), Some(opcode));
        assert_eq!(Opcode::from_value(opcode as u32), Some(opcode));
        assert_eq!(opcode.to_string(), opcode.mnemonic());
    }
}

#[test]
fn mnemonics_are_short_lowercase_and_unique() {
    let mut seen = Vec::new();

    for opcode in Opcode::iter() {
        let mnemonic = opcode.mnemonic();
        assert!(!mnemonic.is_empty() && mnemonic.len() <= 4);
        assert!(mnemonic.bytes().all(|byte| byte.is_ascii_lowercase()));
        assert!(!seen.contains(&mnemonic));
        seen.push(mnemonic);
    }
}

#[test]
fn name_lookup_is_ordered() {
    // The binary search depends on a strictly sorted mnemonic table; iterate
    // the vocabulary in mnemonic order and verify each neighbour pair.
    let mut mnemonics: Vec<_> = Opcode::iter().map(Opcode::mnemonic).collect();
    mnemonics.sort_unstable();

    for pair in mnemonics.windows(2) {
        assert!(pair[0] < pair[1]);
    }
    for mnemonic in mnemonics {
        assert!(Opcode::from_mnemonic(mnemonic).is_some());
    }
}

#[test]
fn opcode_values_clear_the_structural_range() {
    let structural = [
        TYPE_GROUP_BEGIN,
        TYPE_GROUP_END,
        TYPE_INTEGER,
        TYPE_STRING,
        TYPE_DATA,
    ];

    let mut values = Vec::new();
    for opcode in Opcode::iter() {
        let value = opcode as u32;
        assert!(value >= COMMAND_BASE);
        assert!(!structural.contains(&value));
        assert!(!values.contains(&value));
        values.push(value);
    }
}

#[test]
fn values_outside_the_table_resolve_to_none() {
    assert_eq!(Opcode::from_value(0), None);
    assert_eq!(Opcode::from_value(TYPE_DATA), None);
    assert_eq!(Opcode::from_value(COMMAND_BASE - 1), None);
    assert_eq!(Opcode::from_value(0x28), None);
    assert_eq!(Opcode::from_mnemonic("zz"), None);
    assert_eq!(Opcode::from_mnemonic(""), None);
}

#[test]
fn command_tokens_carry_the_wire_value() {
    for opcode in Opcode::iter() {
        let token = Token::from(opcode);
        assert_eq!(token, Token::Cmd(opcode as u32));
        assert!(!token.is_argument());
    }

    assert!(Token::Integer(0).is_argument());
    assert!(Token::String(b"bfm").is_argument());
    assert!(Token::Data(&[0]).is_argument());
    assert!(!Token::GroupBegin.is_argument());
    assert!(!Token::GroupEnd.is_argument());
    assert!(!Token::End.is_argument());
}

#[cfg(feature = "serde")]
#[test]
fn opcodes_survive_serde() {
    for opcode in Opcode::iter() {
        let bytes = bincode::serialize(&opcode).expect("Failed to serialize opcode");
        let back: Opcode = bincode::deserialize(&bytes).expect("Failed to deserialize opcode");
        assert_eq!(opcode, back);
    }
}
