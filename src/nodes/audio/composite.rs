//! Composite node

use dasp_graph::Buffer;

use crate::nodes::{AudioKernel, AudioProcess, InputFrame, Kernel, ProcessContext};
use crate::port::{PortInfo, Rate};
use crate::registry::{NodeManifest, Params};

/// A node that wraps a group of other audio nodes.
///
/// Subnodes are attached with
/// [`Graph::add_subnode`](crate::Graph::add_subnode), which links their
/// output to the hidden `subnodes` port. Every frame the composite emits
/// `gain * (input + subnodes)`.
#[derive(Default)]
pub struct Composite;

impl Composite {
    pub const INPUT: usize = 0;
    pub const GAIN: usize = 1;
    pub const SUBNODES: usize = 2;

    const INPUTS: [PortInfo; 3] = [
        PortInfo::new("input", 0.0).connect_only().doc("Input signal."),
        PortInfo::new("gain", 1.0).edit_only().doc("Output gain."),
        // clamped to zero so only subnode feeds ever reach it
        PortInfo::new("subnodes", 0.0).range(0.0, 0.0).internal(),
    ];

    const OUTPUTS: [PortInfo; 1] = [PortInfo::new("output", 0.0).connect_only()];

    pub const MANIFEST: NodeManifest = NodeManifest {
        type_name: "Composite",
        description: "Group of audio nodes acting as one.",
        rate: Rate::Audio,
        inputs: &Self::INPUTS,
        outputs: &Self::OUTPUTS,
        build,
    };
}

fn build(_: &Params<'_>) -> Kernel {
    Kernel::Audio(AudioKernel::Composite(Composite))
}

impl AudioProcess for Composite {
    fn process(&mut self, _ctx: &ProcessContext, inputs: &InputFrame<'_>, outputs: &mut [Buffer]) {
        let Some(output) = outputs.first_mut() else {
            return;
        };

        let input = inputs.port(Self::INPUT);
        let gain = inputs.port(Self::GAIN);
        let subnodes = inputs.port(Self::SUBNODES);
        let staged = input.iter().zip(gain).zip(subnodes);
        for (sample, ((i, g), s)) in output.iter_mut().zip(staged) {
            *sample = (i + s) * g;
        }
    }
}
