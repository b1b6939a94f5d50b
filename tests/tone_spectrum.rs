use rustfft::{num_complex::Complex, Fft, FftPlanner};
use snake_synth::dsp::{Tone, ToneHistory, ToneSettings};

const RATE: f64 = 48_000.0;
/// 10 Hz bins, so every probe tone lands exactly on a bin.
const WINDOW: usize = 4_800;
const PROBES: [f64; 3] = [100.0, 1_000.0, 8_000.0];

fn probe_signal(len: usize) -> Vec<f64> {
    (0..len)
        .map(|n| {
            let t = n as f64 / RATE;
            PROBES
                .iter()
                .map(|f| 1_000.0 * (std::f64::consts::TAU * f * t).sin())
                .sum()
        })
        .collect()
}

/// Magnitude at each probe frequency of a steady-state window of `tone`'s output.
fn probe_levels(tone: &Tone) -> [f64; 3] {
    let input = probe_signal(WINDOW * 2);
    let mut history = ToneHistory::new(tone);
    let mut output = Vec::new();
    for block in input.chunks(1_000) {
        output.extend(tone.filter_with_history(block, &mut history));
    }

    let mut spectrum: Vec<Complex<f64>> = output[WINDOW..]
        .iter()
        .map(|&x| Complex::new(x, 0.0))
        .collect();
    FftPlanner::<f64>::new()
        .plan_fft_forward(WINDOW)
        .process(&mut spectrum);

    PROBES.map(|f| spectrum[(f * WINDOW as f64 / RATE) as usize].norm())
}

fn ratios(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] / b[0], a[1] / b[1], a[2] / b[2]]
}

#[test]
fn flat_tone_passes_all_bands() {
    let tone = Tone::new(ToneSettings::default()).unwrap();
    let levels = probe_levels(&tone);
    // An undistorted 1000-amplitude sine puts 1000 · N / 2 into its bin.
    let reference = 1_000.0 * WINDOW as f64 / 2.0;
    for (level, f) in levels.iter().zip(PROBES) {
        let ratio = level / reference;
        assert!((ratio - 1.0).abs() < 0.02, "{f} Hz at {ratio}");
    }
}

#[test]
fn bass_cut_only_moves_low_band() {
    let flat = probe_levels(&Tone::new(ToneSettings::default()).unwrap());
    let mut tone = Tone::new(ToneSettings::default()).unwrap();
    tone.set_bass(1.0);
    let [low, mid, high] = ratios(probe_levels(&tone), flat);

    assert!(low < 0.4, "100 Hz kept {low}");
    assert!((mid - 1.0).abs() < 0.02, "1 kHz moved to {mid}");
    assert!((high - 1.0).abs() < 0.02, "8 kHz moved to {high}");
}

#[test]
fn treble_boost_doubles_high_band() {
    let flat = probe_levels(&Tone::new(ToneSettings::default()).unwrap());
    let mut tone = Tone::new(ToneSettings::default()).unwrap();
    // +6 dB
    tone.set_treble(7.0);
    let [low, mid, high] = ratios(probe_levels(&tone), flat);

    assert!((high - 2.0).abs() < 0.05, "8 kHz at {high}");
    assert!((low - 1.0).abs() < 0.02);
    assert!((mid - 1.0).abs() < 0.02);
}
