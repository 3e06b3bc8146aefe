use core::fmt;

/// Command opcode representation for the tracker instruction set.
///
/// Discriminants are the binary wire values; they start at
/// [`COMMAND_BASE`](crate::COMMAND_BASE), above the structural type codes.
/// Each opcode owns a unique lowercase mnemonic of at most four bytes, used
/// by the text form of the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Opcode {
    /// Attack a note.
    Attack = 0x10,
    /// Set the arpeggio step speed.
    ArpeggioSpeed = 0x11,
    /// Release the current note.
    Release = 0x12,
    /// Mute the channel immediately.
    Mute = 0x13,
    /// Mute the channel after the given number of ticks.
    MuteTicks = 0x14,
    /// Set the channel volume.
    Volume = 0x15,
    /// Set the stereo panning.
    Panning = 0x16,
    /// Detune the channel by a pitch offset.
    Pitch = 0x17,
    /// Set the master volume.
    MasterVolume = 0x18,
    /// Advance the pattern by one step.
    Step = 0x19,
    /// Apply an effect with its parameters.
    Effect = 0x1a,
    /// Set the square-wave duty cycle.
    DutyCycle = 0x1b,
    /// Set the sample phase wrap point.
    PhaseWrap = 0x1c,
    /// Select an instrument.
    Instrument = 0x1d,
    /// Open an instrument definition group.
    InstrumentGroup = 0x1e,
    /// Select a waveform.
    Waveform = 0x1f,
    /// Open a waveform definition group.
    WaveformGroup = 0x20,
    /// Open a generic group.
    Group = 0x21,
    /// Set the number of ticks per step.
    StepTicks = 0x22,
    /// Open a track group.
    TrackGroup = 0x23,
    /// Define a volume sequence.
    SequenceVolume = 0x24,
    /// Define a panning sequence.
    SequencePanning = 0x25,
    /// Define an arpeggio sequence.
    SequenceArpeggio = 0x26,
    /// Define a duty-cycle sequence.
    SequenceDutyCycle = 0x27,
}

/// Lookup table from mnemonic to opcode, sorted by mnemonic for binary
/// search. The enum declaration above is the sorted-by-value view.
const NAME_TABLE: &[(&str, Opcode)] = &[
    ("a", Opcode::Attack),
    ("as", Opcode::ArpeggioSpeed),
    ("dc", Opcode::DutyCycle),
    ("e", Opcode::Effect),
    ("g", Opcode::Group),
    ("i", Opcode::Instrument),
    ("inst", Opcode::InstrumentGroup),
    ("m", Opcode::Mute),
    ("mt", Opcode::MuteTicks),
    ("p", Opcode::Panning),
    ("pt", Opcode::Pitch),
    ("pw", Opcode::PhaseWrap),
    ("r", Opcode::Release),
    ("s", Opcode::Step),
    ("sqa", Opcode::SequenceArpeggio),
    ("sqd", Opcode::SequenceDutyCycle),
    ("sqp", Opcode::SequencePanning),
    ("sqv", Opcode::SequenceVolume),
    ("st", Opcode::StepTicks),
    ("trck", Opcode::TrackGroup),
    ("v", Opcode::Volume),
    ("vm", Opcode::MasterVolume),
    ("w", Opcode::Waveform),
    ("wave", Opcode::WaveformGroup),
];

impl Opcode {
    /// Resolve a mnemonic to its opcode.
    pub fn from_mnemonic(mnemonic: &str) -> Option<Self> {
        NAME_TABLE
            .binary_search_by_key(&mnemonic, |(name, _)| *name)
            .ok()
            .map(|index| NAME_TABLE[index].1)
    }

    /// Resolve a wire value to its opcode.
    pub const fn from_value(value: u32) -> Option<Self> {
        use Opcode::*;
        match value {
            0x10 => Some(Attack),
            0x11 => Some(ArpeggioSpeed),
            0x12 => Some(Release),
            0x13 => Some(Mute),
            0x14 => Some(MuteTicks),
            0x15 => Some(Volume),
            0x16 => Some(Panning),
            0x17 => Some(Pitch),
            0x18 => Some(MasterVolume),
            0x19 => Some(Step),
            0x1a => Some(Effect),
            0x1b => Some(DutyCycle),
            0x1c => Some(PhaseWrap),
            0x1d => Some(Instrument),
            0x1e => Some(InstrumentGroup),
            0x1f => Some(Waveform),
            0x20 => Some(WaveformGroup),
            0x21 => Some(Group),
            0x22 => Some(StepTicks),
            0x23 => Some(TrackGroup),
            0x24 => Some(SequenceVolume),
            0x25 => Some(SequencePanning),
            0x26 => Some(SequenceArpeggio),
            0x27 => Some(SequenceDutyCycle),
            _ => None,
        }
    }

    /// The text-form mnemonic of this opcode.
    pub const fn mnemonic(self) -> &'static str {
        use Opcode::*;
        match self {
            Attack => "a",
            ArpeggioSpeed => "as",
            Release => "r",
            Mute => "m",
            MuteTicks => "mt",
            Volume => "v",
            Panning => "p",
            Pitch => "pt",
            MasterVolume => "vm",
            Step => "s",
            Effect => "e",
            DutyCycle => "dc",
            PhaseWrap => "pw",
            Instrument => "i",
            InstrumentGroup => "inst",
            Waveform => "w",
            WaveformGroup => "wave",
            Group => "g",
            StepTicks => "st",
            TrackGroup => "trck",
            SequenceVolume => "sqv",
            SequencePanning => "sqp",
            SequenceArpeggio => "sqa",
            SequenceDutyCycle => "sqd",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}
