//! Square (pulse) wave oscillator

use dasp_graph::Buffer;

use super::wrap_unit;
use crate::control::Control;
use crate::nodes::{AudioKernel, AudioProcess, InputFrame, Kernel, ProcessContext};
use crate::port::{PortInfo, Rate};
use crate::registry::{NodeManifest, Params};

/// A pulse oscillator with variable width and a hard-sync phase input.
///
/// A control delivered to `phase` jumps the oscillator to that phase before
/// the next frame. An audio-rate signal on `phase` takes over instead: the
/// running phase is dropped and the waveform follows `freq / sample_rate +
/// phase[i]` sample by sample.
pub struct SquareWave {
    phase: f32,
}

impl SquareWave {
    pub const FREQ: usize = 0;
    pub const WIDTH: usize = 1;
    pub const GAIN: usize = 2;
    pub const PHASE: usize = 3;

    const INPUTS: [PortInfo; 4] = [
        PortInfo::new("freq", 220.0)
            .range(0.0, 24_000.0)
            .doc("Oscillator frequency."),
        PortInfo::new("width", 0.5)
            .range(0.0, 1.0)
            .doc("Pulse width of wave as fraction of full wavelength."),
        PortInfo::new("gain", 1.0).doc("Output gain."),
        PortInfo::new("phase", 0.0)
            .range(0.0, 1.0)
            .event()
            .connect_only()
            .doc("Oscillator phase."),
    ];

    const OUTPUTS: [PortInfo; 1] = [PortInfo::new("output", 0.0).connect_only()];

    pub const MANIFEST: NodeManifest = NodeManifest {
        type_name: "SquareWave",
        description: "Standard square wave oscillator.",
        rate: Rate::Audio,
        inputs: &Self::INPUTS,
        outputs: &Self::OUTPUTS,
        build,
    };

    pub fn new() -> Self {
        Self { phase: 0.0 }
    }

    #[inline]
    pub fn phase(&self) -> f32 {
        self.phase
    }
}

impl Default for SquareWave {
    fn default() -> Self {
        Self::new()
    }
}

fn build(_: &Params<'_>) -> Kernel {
    Kernel::Audio(AudioKernel::SquareWave(SquareWave::new()))
}

impl AudioProcess for SquareWave {
    fn receive_control(&mut self, port: usize, control: Control) {
        if port == Self::PHASE {
            // hard sync
            self.phase = wrap_unit(control.as_float());
        }
    }

    fn process(&mut self, ctx: &ProcessContext, inputs: &InputFrame<'_>, outputs: &mut [Buffer]) {
        let Some(output) = outputs.first_mut() else {
            return;
        };

        let freq = inputs.port(Self::FREQ);
        let width = inputs.port(Self::WIDTH);
        let gain = inputs.port(Self::GAIN);
        let phase_in = inputs.port(Self::PHASE);
        // audio-rate phase input replaces the running phase
        let phase_ctl = if inputs.audio_feeds(Self::PHASE) > 0 { 0.0 } else { 1.0 };
        let sample_rate = ctx.sample_rate as f32;

        let staged = freq.iter().zip(width).zip(gain).zip(phase_in);
        for (sample, (((f, w), g), p)) in output.iter_mut().zip(staged) {
            *sample = if self.phase < *w { *g } else { -*g };
            self.phase = wrap_unit(self.phase * phase_ctl + f / sample_rate + p);
        }
    }
}
