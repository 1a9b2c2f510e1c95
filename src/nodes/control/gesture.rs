//! Touch/stylus field splitter

use crate::control::Control;
use crate::nodes::{ControlKernel, ControlProcess, Kernel};
use crate::port::{PortInfo, Rate};
use crate::registry::{NodeManifest, Params};
use crate::router::Emitter;

const FIELDS: usize = 5;

/// Splits a gesture sample into its fields.
///
/// An input device feeds a [`Control::Vector`] of `(x, y, pressure, tilt,
/// rotation)`; each field leaves on its own output as a float. Missing
/// lanes are not emitted.
#[derive(Default)]
pub struct Gesture {
    last: [f32; FIELDS],
}

impl Gesture {
    pub const FIELDS: usize = FIELDS;

    const OUTPUTS: [PortInfo; FIELDS] = [
        PortInfo::new("x", 0.0).control().connect_only(),
        PortInfo::new("y", 0.0).control().connect_only(),
        PortInfo::new("pressure", 0.0).control().connect_only(),
        PortInfo::new("tilt", 0.0).control().connect_only(),
        PortInfo::new("rotation", 0.0).control().connect_only(),
    ];

    pub const MANIFEST: NodeManifest = NodeManifest {
        type_name: "Gesture",
        description: "Emits the fields of a touch or stylus gesture.",
        rate: Rate::Control,
        inputs: &[],
        outputs: &Self::OUTPUTS,
        build,
    };

    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent value of each field.
    #[inline]
    pub fn last(&self) -> [f32; FIELDS] {
        self.last
    }
}

fn build(_: &Params<'_>) -> Kernel {
    Kernel::Control(ControlKernel::Gesture(Gesture::new()))
}

impl ControlProcess for Gesture {
    fn receive_control(&mut self, _port: usize, _control: Control, _out: &mut Emitter) {}

    fn feed(&mut self, control: Control, out: &mut Emitter) {
        let Control::Vector(fields) = control else {
            return;
        };
        for (port, value) in fields.as_slice().iter().take(Self::FIELDS).enumerate() {
            self.last[port] = *value;
            out.emit(port, Control::Float(*value));
        }
    }
}
