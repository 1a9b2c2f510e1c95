//! Table-lookup oscillator

use std::sync::Arc;

use arc_swap::ArcSwap;
use dasp_graph::Buffer;

use super::wrap_unit;
use crate::nodes::{AudioKernel, AudioProcess, InputFrame, Kernel, ProcessContext};
use crate::port::{PortInfo, Rate};
use crate::registry::{NodeManifest, Params};

/// One cycle of a user-drawn waveform, shared between the kernel and its
/// node so the editor can swap it while the graph plays.
pub type WaveTable = Arc<ArcSwap<Vec<f32>>>;

/// Points in the table a new oscillator starts with.
pub const DEFAULT_TABLE_LEN: usize = 64;

/// Which input sets the pitch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Pitch {
    Freq,
    Dur,
}

/// An oscillator that loops over a table of samples, interpolating
/// linearly between points.
///
/// The pitch comes from either `freq` (Hz) or `dur` (seconds per cycle),
/// whichever was edited last. An audio-rate `freq` always wins.
pub struct Waveform {
    table: WaveTable,
    phase: f32,
    pitch: Pitch,
    last_freq: f32,
    last_dur: f32,
}

impl Waveform {
    pub const FREQ: usize = 0;
    pub const GAIN: usize = 1;
    pub const DUR: usize = 2;

    const INPUTS: [PortInfo; 3] = [
        PortInfo::new("freq", 220.0)
            .range(0.0, 24_000.0)
            .doc("Oscillator frequency."),
        PortInfo::new("gain", 1.0).doc("Output gain."),
        PortInfo::new("dur", 1.0 / 220.0)
            .range(1.0 / 24_000.0, 60.0)
            .edit_only()
            .doc("Oscillator duration or wavelength (seconds)."),
    ];

    const OUTPUTS: [PortInfo; 1] = [PortInfo::new("output", 0.0).connect_only()];

    pub const MANIFEST: NodeManifest = NodeManifest {
        type_name: "Waveform",
        description: "User-defined waveform oscillator.",
        rate: Rate::Audio,
        inputs: &Self::INPUTS,
        outputs: &Self::OUTPUTS,
        build,
    };

    /// A single sine cycle, pitched by `freq` until `dur` is edited.
    pub fn new(freq: f32, dur: f32) -> Self {
        let table = (0..DEFAULT_TABLE_LEN)
            .map(|i| (i as f32 / DEFAULT_TABLE_LEN as f32 * core::f32::consts::TAU).sin())
            .collect();
        Self {
            table: Arc::new(ArcSwap::from_pointee(table)),
            phase: 0.0,
            pitch: Pitch::Freq,
            last_freq: freq,
            last_dur: dur,
        }
    }

    /// Handle to the sample table.
    pub fn table(&self) -> WaveTable {
        Arc::clone(&self.table)
    }

    #[inline]
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Follow whichever of `freq` / `dur` changed since the previous frame.
    fn update_pitch(&mut self, freq: f32, dur: f32) {
        if dur != self.last_dur {
            self.pitch = Pitch::Dur;
        }
        if freq != self.last_freq {
            self.pitch = Pitch::Freq;
        }
        self.last_freq = freq;
        self.last_dur = dur;
    }
}

fn build(params: &Params<'_>) -> Kernel {
    let freq = params.value(Waveform::FREQ);
    let dur = params.value(Waveform::DUR);
    let mut waveform = Waveform::new(freq, dur);
    if dur != Waveform::INPUTS[Waveform::DUR].default {
        waveform.pitch = Pitch::Dur;
    }
    Kernel::Audio(AudioKernel::Waveform(waveform))
}

impl AudioProcess for Waveform {
    fn process(&mut self, ctx: &ProcessContext, inputs: &InputFrame<'_>, outputs: &mut [Buffer]) {
        let Some(output) = outputs.first_mut() else {
            return;
        };

        let freq = inputs.port(Self::FREQ);
        let gain = inputs.port(Self::GAIN);
        let dur = inputs.port(Self::DUR);
        let sample_rate = ctx.sample_rate as f32;

        let audio_freq = inputs.audio_feeds(Self::FREQ) > 0;
        if let (false, Some(f), Some(d)) = (audio_freq, freq.first(), dur.first()) {
            self.update_pitch(*f, *d);
        }
        let by_dur = !audio_freq && self.pitch == Pitch::Dur;

        let table = self.table.load();
        if table.is_empty() {
            output.fill(0.0);
            return;
        }
        let len = table.len();

        for (((sample, f), g), d) in output.iter_mut().zip(freq).zip(gain).zip(dur) {
            let pos = self.phase * len as f32;
            let i = (pos as usize).min(len - 1);
            let frac = pos - i as f32;
            let a = table[i];
            let b = table[(i + 1) % len];
            *sample = (a + (b - a) * frac) * g;

            let step = if by_dur { 1.0 / (d * sample_rate) } else { f / sample_rate };
            self.phase = wrap_unit(self.phase + step);
        }
    }
}
