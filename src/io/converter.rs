use std::ops::RangeInclusive;

use crate::io::midi::MidiEvent;
use crate::synth::message::SynthMessage;
use crate::synth::note::{self, Note};

/// MIDI keys that trigger notes: exactly the wave bank's range, C0..B8.
pub const PLAYABLE_KEYS: RangeInclusive<u8> = note::LOWEST.midi()..=note::HIGHEST.midi();

/// Map a MIDI event to an engine message. Channels are not filtered.
pub fn midi_to_synth(midi: MidiEvent) -> Option<SynthMessage> {
    match midi {
        MidiEvent::NoteOn { key, .. } => playable(key).map(SynthMessage::NoteOn),
        MidiEvent::NoteOff { key, .. } => playable(key).map(|note| SynthMessage::NoteOff(Some(note))),
    }
}

fn playable(key: u8) -> Option<Note> {
    if PLAYABLE_KEYS.contains(&key) {
        Note::from_midi(key)
    } else {
        tracing::debug!(key, "MIDI key outside playable range");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_notes_from_any_channel() {
        let on = MidiEvent::NoteOn {
            channel: 9,
            key: 69,
            velocity: 1,
        };
        let a4 = "A4".parse().unwrap();
        assert_eq!(midi_to_synth(on), Some(SynthMessage::NoteOn(a4)));

        let off = MidiEvent::NoteOff {
            channel: 0,
            key: 69,
            velocity: 0,
        };
        assert_eq!(midi_to_synth(off), Some(SynthMessage::NoteOff(Some(a4))));
    }

    #[test]
    fn drops_keys_outside_range() {
        for key in [0, 11, 120, 121, 122, 127] {
            let on = MidiEvent::NoteOn {
                channel: 0,
                key,
                velocity: 90,
            };
            assert_eq!(midi_to_synth(on), None);
        }
        let lowest = MidiEvent::NoteOn {
            channel: 0,
            key: 12,
            velocity: 90,
        };
        assert!(midi_to_synth(lowest).is_some());
        let highest = MidiEvent::NoteOn {
            channel: 0,
            key: 119,
            velocity: 90,
        };
        assert!(midi_to_synth(highest).is_some());
    }
}
