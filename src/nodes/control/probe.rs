//! Control tap

use crate::control::Control;
use crate::nodes::{ControlKernel, ControlProcess, Kernel};
use crate::port::{PortInfo, Rate};
use crate::registry::{NodeManifest, Params};
use crate::router::Emitter;

/// Counts what it receives and forwards it unchanged.
#[derive(Default)]
pub struct Probe {
    count: u64,
    last: Option<Control>,
}

impl Probe {
    pub const INPUT: usize = 0;

    const INPUTS: [PortInfo; 1] = [PortInfo::new("input", 0.0).control().connect_only()];

    const OUTPUTS: [PortInfo; 1] = [PortInfo::new("output", 0.0).control().connect_only()];

    pub const MANIFEST: NodeManifest = NodeManifest {
        type_name: "Probe",
        description: "Records and forwards control values.",
        rate: Rate::Control,
        inputs: &Self::INPUTS,
        outputs: &Self::OUTPUTS,
        build,
    };

    pub fn new() -> Self {
        Self::default()
    }

    /// Number of controls delivered so far.
    #[inline]
    pub fn count(&self) -> u64 {
        self.count
    }

    #[inline]
    pub fn last(&self) -> Option<Control> {
        self.last
    }
}

fn build(_: &Params<'_>) -> Kernel {
    Kernel::Control(ControlKernel::Probe(Probe::new()))
}

impl ControlProcess for Probe {
    fn receive_control(&mut self, _port: usize, control: Control, out: &mut Emitter) {
        self.count += 1;
        self.last = Some(control);
        out.emit(0, control);
    }
}
