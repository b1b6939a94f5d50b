//! snake - monophonic keyboard / MIDI synthesizer
//!
//! Run with: cargo run --bin snake -- --help

mod keyboard;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Result as EyreResult, WrapErr};
use tracing_subscriber::EnvFilter;

use snake_synth::{
    dsp::Waveform,
    io::{self, CpalSinkFactory, MidiTriggerSource},
    synth::Engine,
    SynthConfig, SynthError,
};

#[derive(Parser)]
#[command(name = "snake")]
#[command(author, version, about = "Monophonic wavetable synthesizer", long_about = None)]
struct Args {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Keyboard input only; do not open a MIDI port
    #[arg(long)]
    no_midi: bool,

    /// Print the available MIDI input ports and exit
    #[arg(long)]
    list_midi: bool,

    /// Starting waveform (sine, square, triangle, sawtooth)
    #[arg(short, long)]
    waveform: Option<Waveform>,

    /// Enable the bass/mid/treble stage
    #[arg(long)]
    tone: bool,
}

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if args.list_midi {
        let ports = io::list_ports()?;
        if ports.is_empty() {
            println!("no MIDI input ports");
        }
        for port in ports {
            println!("{port}");
        }
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => SynthConfig::load(path)
            .wrap_err_with(|| format!("failed to load config from {}", path.display()))?,
        None => SynthConfig::default(),
    };
    if let Some(waveform) = args.waveform {
        config.waveform = waveform;
    }
    if args.tone {
        config.tone_enabled = true;
    }

    let sinks = Arc::new(CpalSinkFactory::new(config.sample_rate)?);
    let (synth, engine) = Engine::start(&config, sinks)?;

    let _midi = if args.no_midi {
        None
    } else {
        match MidiTriggerSource::connect(config.midi_port.as_deref(), synth.clone()) {
            Ok(source) => Some(source),
            Err(err @ SynthError::NoTriggerDevice(_)) => {
                tracing::warn!("{err}; continuing with keyboard input only");
                None
            }
            Err(err) => return Err(err.into()),
        }
    };

    let result = keyboard::run(&synth, &config);

    synth.shutdown();
    if engine.join().is_err() {
        tracing::error!("engine thread panicked");
    }
    result
}
