use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SynthError};

/*
Notes
=====

A note is its MIDI number: C-1 = 0, C4 = 60, A4 = 69. The wave bank only
holds C0 (12) through B8 (119).

    frequency = 440 · 2^((number - 69) / 12)

Names are a letter, an optional `#` or `b`, then the octave: `A4`, `C#3`,
`Db5`, `B-1`.
*/

pub const LOWEST: Note = Note(12);
pub const HIGHEST: Note = Note(119);

const NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Note(u8);

impl Note {
    pub fn from_midi(number: u8) -> Option<Self> {
        (number <= 127).then_some(Self(number))
    }

    pub const fn midi(self) -> u8 {
        self.0
    }

    /// Equal-tempered frequency in Hz.
    pub fn frequency(self) -> f64 {
        440.0 * 2f64.powf((f64::from(self.0) - 69.0) / 12.0)
    }

    pub fn octave(self) -> i8 {
        (self.0 / 12) as i8 - 1
    }

    /// Shift by whole octaves; `None` when the result leaves the MIDI range.
    pub fn transpose(self, octaves: i8) -> Option<Self> {
        let shifted = i16::from(self.0) + i16::from(octaves) * 12;
        u8::try_from(shifted).ok().and_then(Self::from_midi)
    }

    /// All notes held by the wave bank, lowest first.
    pub fn bank_range() -> impl Iterator<Item = Note> {
        (LOWEST.0..=HIGHEST.0).map(Note)
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", NAMES[usize::from(self.0 % 12)], self.octave())
    }
}

impl FromStr for Note {
    type Err = SynthError;

    fn from_str(s: &str) -> Result<Self> {
        let unknown = || SynthError::UnknownNote(s.to_string());

        let mut chars = s.chars();
        let letter = chars.next().ok_or_else(unknown)?;
        let base: i16 = match letter.to_ascii_uppercase() {
            'C' => 0,
            'D' => 2,
            'E' => 4,
            'F' => 5,
            'G' => 7,
            'A' => 9,
            'B' => 11,
            _ => return Err(unknown()),
        };

        let rest = chars.as_str();
        let (accidental, octave) = if let Some(o) = rest.strip_prefix('#') {
            (1, o)
        } else if let Some(o) = rest.strip_prefix('b') {
            (-1, o)
        } else {
            (0, rest)
        };
        let octave: i16 = octave.parse().map_err(|_| unknown())?;

        let number = (octave + 1) * 12 + base + accidental;
        u8::try_from(number)
            .ok()
            .and_then(Note::from_midi)
            .ok_or_else(unknown)
    }
}
