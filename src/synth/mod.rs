// Purpose: Voices, the audio worker pool and parameter dispatch
// This layer sits above the dsp stages and wires them to threads and sinks

pub mod bank;
pub mod controls;
pub mod engine;
pub mod message;
pub mod note;
pub mod pool;
pub mod voice;

pub use bank::WaveBank;
pub use controls::{ControlSnapshot, SharedControls};
pub use engine::{channel, Engine, SynthHandle};
pub use message::{MessageReceiver, SynthMessage};
pub use note::Note;
pub use pool::VoicePool;
pub use voice::{play_voice, PlayTask};
