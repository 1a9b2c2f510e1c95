//! Sine wave oscillator

use dasp_graph::Buffer;

use super::wrap_unit;
use crate::nodes::{AudioKernel, AudioProcess, InputFrame, Kernel, ProcessContext};
use crate::port::{PortInfo, Rate};
use crate::registry::{NodeManifest, Params};

/// A sine wave oscillator (mono source)
pub struct Sine {
    phase: f32,
}

impl Sine {
    pub const FREQ: usize = 0;
    pub const GAIN: usize = 1;

    const INPUTS: [PortInfo; 2] = [
        PortInfo::new("freq", 220.0)
            .range(0.0, 24_000.0)
            .doc("Oscillator frequency."),
        PortInfo::new("gain", 1.0).doc("Output gain."),
    ];

    const OUTPUTS: [PortInfo; 1] = [PortInfo::new("output", 0.0).connect_only()];

    pub const MANIFEST: NodeManifest = NodeManifest {
        type_name: "SineWave",
        description: "Standard sine wave oscillator.",
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

impl Default for Sine {
    fn default() -> Self {
        Self::new()
    }
}

fn build(_: &Params<'_>) -> Kernel {
    Kernel::Audio(AudioKernel::Sine(Sine::new()))
}

impl AudioProcess for Sine {
    fn process(&mut self, ctx: &ProcessContext, inputs: &InputFrame<'_>, outputs: &mut [Buffer]) {
        let Some(output) = outputs.first_mut() else {
            return;
        };

        let freq = inputs.port(Self::FREQ);
        let gain = inputs.port(Self::GAIN);
        let sample_rate = ctx.sample_rate as f32;

        for ((sample, f), g) in output.iter_mut().zip(freq).zip(gain) {
            *sample = (self.phase * core::f32::consts::TAU).sin() * g;
            self.phase = wrap_unit(self.phase + f / sample_rate);
        }
    }
}
