//! Constant (DC) source

use dasp_graph::Buffer;

use crate::nodes::{AudioKernel, AudioProcess, InputFrame, Kernel, ProcessContext};
use crate::port::{PortInfo, Rate};
use crate::registry::{NodeManifest, Params};

/// Outputs its `value` input unchanged.
///
/// With nothing connected this is a DC source. Fed by a control node it
/// turns each control value into a held audio-rate signal.
#[derive(Default)]
pub struct Constant;

impl Constant {
    pub const VALUE: usize = 0;

    const INPUTS: [PortInfo; 1] = [PortInfo::new("value", 0.0).doc("Output value.")];

    const OUTPUTS: [PortInfo; 1] = [PortInfo::new("output", 0.0).connect_only()];

    pub const MANIFEST: NodeManifest = NodeManifest {
        type_name: "Constant",
        description: "Constant value, held across every frame.",
        rate: Rate::Audio,
        inputs: &Self::INPUTS,
        outputs: &Self::OUTPUTS,
        build,
    };
}

fn build(_: &Params<'_>) -> Kernel {
    Kernel::Audio(AudioKernel::Constant(Constant))
}

impl AudioProcess for Constant {
    fn process(&mut self, _ctx: &ProcessContext, inputs: &InputFrame<'_>, outputs: &mut [Buffer]) {
        let value = inputs.port(Self::VALUE);
        for buffer in outputs.iter_mut() {
            buffer[..value.len()].copy_from_slice(value);
        }
    }
}
