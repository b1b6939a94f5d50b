// Purpose - audio sinks, trigger sources, format conversions

pub mod converter;
pub mod cpal_sink;
pub mod midi;
pub mod sink;

pub use cpal_sink::{CpalSink, CpalSinkFactory};
pub use midi::{list_ports, MidiEvent, MidiTriggerSource};
pub use sink::{AudioSink, MemorySink, SinkFactory};
