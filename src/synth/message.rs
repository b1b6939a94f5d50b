use crossbeam_channel::Receiver;

use super::note::Note;
use crate::dsp::oscillator::Waveform;

/// Everything the UI and trigger sources can ask of the dispatcher.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum SynthMessage {
    NoteOn(Note),
    /// Release the sounding voice. With a note, only if that note is the one
    /// sounding (MIDI key-up after a newer key was pressed is ignored).
    NoteOff(Option<Note>),
    UpdateAttack(f64),
    UpdateDecay(f64),
    UpdateSustain(f64),
    UpdateRelease(f64),
    SetVolume(f64),
    SetBass(f64),
    SetMid(f64),
    SetTreble(f64),
    SetToneEnabled(bool),
    SelectWaveform(Waveform),
    SetOctaveShift(i8),
    Shutdown,
}

pub trait MessageReceiver {
    /// Block until a message arrives; `None` once every sender is gone.
    fn recv(&mut self) -> Option<SynthMessage>;
}

impl MessageReceiver for Receiver<SynthMessage> {
    fn recv(&mut self) -> Option<SynthMessage> {
        Receiver::recv(self).ok()
    }
}
