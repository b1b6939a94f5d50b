use midir::{MidiInput, MidiInputConnection, MidiInputPort};

use super::converter::midi_to_synth;
use crate::error::{Result, SynthError};
use crate::synth::engine::SynthHandle;

const CLIENT_NAME: &str = "snake_synth";

/// The channel-voice messages the synthesizer reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiEvent {
    NoteOn { channel: u8, key: u8, velocity: u8 },
    NoteOff { channel: u8, key: u8, velocity: u8 },
}

impl MidiEvent {
    /// Decode a raw message. Note-on with velocity 0 is a note-off.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        let [status, key, velocity, ..] = *bytes else {
            return None;
        };
        let channel = status & 0x0F;
        let (key, velocity) = (key & 0x7F, velocity & 0x7F);
        match status & 0xF0 {
            0x90 if velocity > 0 => Some(MidiEvent::NoteOn {
                channel,
                key,
                velocity,
            }),
            0x80 | 0x90 => Some(MidiEvent::NoteOff {
                channel,
                key,
                velocity,
            }),
            _ => None,
        }
    }
}

/// Names of the MIDI input ports currently visible.
pub fn list_ports() -> Result<Vec<String>> {
    let input = open_input()?;
    Ok(input
        .ports()
        .iter()
        .filter_map(|port| input.port_name(port).ok())
        .collect())
}

/// A live MIDI input feeding note triggers into a [`SynthHandle`].
/// Dropping it closes the port.
pub struct MidiTriggerSource {
    port: String,
    _connection: MidiInputConnection<()>,
}

impl MidiTriggerSource {
    /// Connect to the port called `port`, or the first port when `None`.
    ///
    /// Fails with [`SynthError::NoTriggerDevice`] when there is no such port;
    /// callers carry on with keyboard input only.
    pub fn connect(port: Option<&str>, handle: SynthHandle) -> Result<Self> {
        let input = open_input()?;
        let (target, name) = find_port(&input, port)?;

        let connection = input
            .connect(
                &target,
                "snake-synth-in",
                move |_stamp, bytes, _| {
                    if let Some(message) = MidiEvent::parse(bytes).and_then(midi_to_synth) {
                        handle.send(message);
                    }
                },
                (),
            )
            .map_err(|err| SynthError::NoTriggerDevice(format!("cannot open '{name}': {err}")))?;

        tracing::info!(port = %name, "MIDI input connected");
        Ok(Self {
            port: name,
            _connection: connection,
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port
    }
}

fn open_input() -> Result<MidiInput> {
    MidiInput::new(CLIENT_NAME).map_err(|err| SynthError::NoTriggerDevice(err.to_string()))
}

fn find_port(input: &MidiInput, wanted: Option<&str>) -> Result<(MidiInputPort, String)> {
    let mut named = input
        .ports()
        .into_iter()
        .filter_map(|port| input.port_name(&port).ok().map(|name| (port, name)));

    match wanted {
        Some(wanted) => named
            .find(|(_, name)| name == wanted)
            .ok_or_else(|| SynthError::NoTriggerDevice(format!("MIDI port '{wanted}' not found"))),
        None => named
            .next()
            .ok_or_else(|| SynthError::NoTriggerDevice("no MIDI input ports".into())),
    }
}
