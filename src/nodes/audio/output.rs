//! Output sink

use dasp_graph::Buffer;

use crate::nodes::{AudioKernel, AudioProcess, InputFrame, Kernel, ProcessContext};
use crate::port::{PortInfo, Rate};
use crate::registry::{NodeManifest, Params};

/// The node an audio driver renders from.
///
/// Everything patched into `input` is summed by the pull itself, so an
/// output doubles as the mixer for every voice that reaches it.
#[derive(Default)]
pub struct Output;

impl Output {
    pub const INPUT: usize = 0;
    pub const GAIN: usize = 1;

    const INPUTS: [PortInfo; 2] = [
        PortInfo::new("input", 0.0).connect_only().doc("Signal sent to the device."),
        PortInfo::new("gain", 1.0).range(0.0, 4.0).doc("Master gain."),
    ];

    const OUTPUTS: [PortInfo; 1] = [PortInfo::new("output", 0.0).connect_only()];

    pub const MANIFEST: NodeManifest = NodeManifest {
        type_name: "Output",
        description: "Sends its input to the audio device.",
        rate: Rate::Audio,
        inputs: &Self::INPUTS,
        outputs: &Self::OUTPUTS,
        build,
    };
}

fn build(_: &Params<'_>) -> Kernel {
    Kernel::Audio(AudioKernel::Output(Output))
}

impl AudioProcess for Output {
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
