//! Gain/volume control effect

use dasp_graph::Buffer;

use crate::nodes::{AudioKernel, AudioProcess, InputFrame, Kernel, ProcessContext};
use crate::port::{PortInfo, Rate};
use crate::registry::{NodeManifest, Params};

/// Multiplies `input` by `gain`, sample by sample.
///
/// Both ports take audio, so `gain` doubles as a ring modulator when a
/// second oscillator is patched into it.
#[derive(Default)]
pub struct Gain;

impl Gain {
    pub const INPUT: usize = 0;
    pub const GAIN: usize = 1;

    const INPUTS: [PortInfo; 2] = [
        PortInfo::new("input", 0.0).connect_only().doc("Input signal."),
        PortInfo::new("gain", 1.0).doc("Gain multiplier (1.0 = unity, 0.0 = silence)."),
    ];

    const OUTPUTS: [PortInfo; 1] = [PortInfo::new("output", 0.0).connect_only()];

    pub const MANIFEST: NodeManifest = NodeManifest {
        type_name: "Gain",
        description: "Scales its input.",
        rate: Rate::Audio,
        inputs: &Self::INPUTS,
        outputs: &Self::OUTPUTS,
        build,
    };
}

fn build(_: &Params<'_>) -> Kernel {
    Kernel::Audio(AudioKernel::Gain(Gain))
}

impl AudioProcess for Gain {
    fn process(&mut self, _ctx: &ProcessContext, inputs: &InputFrame<'_>, outputs: &mut [Buffer]) {
        let Some(output) = outputs.first_mut() else {
            return;
        };

        let input = inputs.port(Self::INPUT);
        let gain = inputs.port(Self::GAIN);
        for ((sample, i), g) in output.iter_mut().zip(input).zip(gain) {
            *sample = i * g;
        }
    }
}
