//! Computer keyboard as a note-trigger source.
//!
//! Terminals only report key presses, so a note is held until the same key
//! is pressed again or space is hit.

use std::io::Write;
use std::time::Duration;

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal;

use snake_synth::{
    dsp::Waveform,
    synth::{Note, SynthHandle, SynthMessage},
    SynthConfig,
};

/// Piano layout on the home row, semitones above C of the base octave.
const PIANO_KEYS: [(char, u8); 17] = [
    ('a', 0),
    ('w', 1),
    ('s', 2),
    ('e', 3),
    ('d', 4),
    ('f', 5),
    ('t', 6),
    ('g', 7),
    ('y', 8),
    ('h', 9),
    ('u', 10),
    ('j', 11),
    ('k', 12),
    ('o', 13),
    ('l', 14),
    ('p', 15),
    (';', 16),
];

/// MIDI number of C4.
const BASE_C: u8 = 60;
const MAX_SHIFT: i8 = 4;
const MAX_VOLUME: f64 = 12.0;

const HELP: &str = "\
  piano  a w s e d f t g y h u j k o l p ;   (same key again or space: release)
  z / x  octave down / up     [ / ]  volume down / up
  1-4    sine square triangle sawtooth     b  tone on/off     q  quit";

#[derive(Debug, PartialEq)]
pub enum KeyAction {
    Send(SynthMessage),
    Quit,
    Ignored,
}

/// What the keyboard remembers between presses.
pub struct KeyboardState {
    held: Option<Note>,
    octave_shift: i8,
    volume: f64,
    tone_enabled: bool,
}

impl KeyboardState {
    pub fn new(config: &SynthConfig) -> Self {
        Self {
            held: None,
            octave_shift: config.octave_shift.clamp(-MAX_SHIFT, MAX_SHIFT),
            volume: config.volume,
            tone_enabled: config.tone_enabled,
        }
    }

    pub fn on_key(&mut self, code: KeyCode) -> KeyAction {
        let KeyCode::Char(c) = code else {
            return match code {
                KeyCode::Esc => KeyAction::Quit,
                _ => KeyAction::Ignored,
            };
        };
        let c = c.to_ascii_lowercase();

        if let Some(&(_, semitone)) = PIANO_KEYS.iter().find(|(key, _)| *key == c) {
            let Some(note) = Note::from_midi(BASE_C + semitone) else {
                return KeyAction::Ignored;
            };
            return if self.held == Some(note) {
                self.held = None;
                KeyAction::Send(SynthMessage::NoteOff(None))
            } else {
                self.held = Some(note);
                KeyAction::Send(SynthMessage::NoteOn(note))
            };
        }

        let message = match c {
            ' ' => {
                self.held = None;
                SynthMessage::NoteOff(None)
            }
            'z' | 'x' => {
                let step = if c == 'z' { -1 } else { 1 };
                self.octave_shift =
                    self.octave_shift.saturating_add(step).clamp(-MAX_SHIFT, MAX_SHIFT);
                SynthMessage::SetOctaveShift(self.octave_shift)
            }
            '[' | ']' => {
                let step = if c == '[' { -1.0 } else { 1.0 };
                self.volume = (self.volume + step).clamp(0.0, MAX_VOLUME);
                SynthMessage::SetVolume(self.volume)
            }
            '1'..='4' => {
                let index = usize::from(c as u8 - b'1');
                SynthMessage::SelectWaveform(Waveform::ALL[index])
            }
            'b' => {
                self.tone_enabled = !self.tone_enabled;
                SynthMessage::SetToneEnabled(self.tone_enabled)
            }
            'q' => return KeyAction::Quit,
            _ => return KeyAction::Ignored,
        };
        KeyAction::Send(message)
    }
}

/// Restores cooked mode on drop, including on error paths.
struct RawMode;

impl RawMode {
    fn enable() -> EyreResult<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

/// Read keys until `q` or Esc, forwarding them to the engine.
pub fn run(synth: &SynthHandle, config: &SynthConfig) -> EyreResult<()> {
    println!("=== snake ===");
    println!("Sample rate: {} Hz", config.sample_rate);
    println!("Waveform: {}", config.waveform);
    println!("{HELP}");
    println!();
    std::io::stdout().flush()?;

    let _raw = RawMode::enable()?;
    let mut state = KeyboardState::new(config);

    loop {
        if !event::poll(Duration::from_millis(16))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        match state.on_key(key.code) {
            KeyAction::Send(message) => synth.send(message),
            KeyAction::Quit => break,
            KeyAction::Ignored => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> KeyboardState {
        KeyboardState::new(&SynthConfig::default())
    }

    #[test]
    fn same_key_toggles_note() {
        let mut state = state();
        let c4 = "C4".parse().unwrap();
        assert_eq!(
            state.on_key(KeyCode::Char('a')),
            KeyAction::Send(SynthMessage::NoteOn(c4))
        );
        assert_eq!(
            state.on_key(KeyCode::Char('a')),
            KeyAction::Send(SynthMessage::NoteOff(None))
        );
        assert_eq!(
            state.on_key(KeyCode::Char('h')),
            KeyAction::Send(SynthMessage::NoteOn("A4".parse().unwrap()))
        );
    }

    #[test]
    fn octave_and_volume_are_clamped() {
        let mut state = state();
        for _ in 0..10 {
            state.on_key(KeyCode::Char('x'));
        }
        assert_eq!(
            state.on_key(KeyCode::Char('x')),
            KeyAction::Send(SynthMessage::SetOctaveShift(MAX_SHIFT))
        );
        for _ in 0..20 {
            state.on_key(KeyCode::Char('['));
        }
        assert_eq!(
            state.on_key(KeyCode::Char('[')),
            KeyAction::Send(SynthMessage::SetVolume(0.0))
        );
    }

    #[test]
    fn extreme_configured_shift_is_clamped() {
        let mut state = KeyboardState::new(&SynthConfig {
            octave_shift: i8::MAX,
            ..SynthConfig::default()
        });
        assert_eq!(
            state.on_key(KeyCode::Char('x')),
            KeyAction::Send(SynthMessage::SetOctaveShift(MAX_SHIFT))
        );

        let mut state = KeyboardState::new(&SynthConfig {
            octave_shift: i8::MIN,
            ..SynthConfig::default()
        });
        assert_eq!(
            state.on_key(KeyCode::Char('z')),
            KeyAction::Send(SynthMessage::SetOctaveShift(-MAX_SHIFT))
        );
    }

    #[test]
    fn waveform_keys_and_quit() {
        let mut state = state();
        assert_eq!(
            state.on_key(KeyCode::Char('4')),
            KeyAction::Send(SynthMessage::SelectWaveform(Waveform::Sawtooth))
        );
        assert_eq!(state.on_key(KeyCode::Char('q')), KeyAction::Quit);
        assert_eq!(state.on_key(KeyCode::Esc), KeyAction::Quit);
        assert_eq!(state.on_key(KeyCode::Char('m')), KeyAction::Ignored);
    }
}
