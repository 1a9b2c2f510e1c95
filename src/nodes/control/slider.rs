//! Editable value source

use crate::control::Control;
use crate::nodes::{ControlKernel, ControlProcess, Kernel};
use crate::port::{PortInfo, Rate};
use crate::registry::{NodeManifest, Params};
use crate::router::Emitter;

/// Re-emits its value whenever it is edited or fed.
pub struct Slider {
    value: f32,
}

impl Slider {
    pub const VALUE: usize = 0;

    const INPUTS: [PortInfo; 1] = [PortInfo::new("value", 0.0)
        .range(-1.0e6, 1.0e6)
        .control()
        .doc("Current slider position.")];

    const OUTPUTS: [PortInfo; 1] = [PortInfo::new("value", 0.0).control().connect_only()];

    pub const MANIFEST: NodeManifest = NodeManifest {
        type_name: "Slider",
        description: "Emits its value whenever it changes.",
        rate: Rate::Control,
        inputs: &Self::INPUTS,
        outputs: &Self::OUTPUTS,
        build,
    };

    pub fn new(value: f32) -> Self {
        Self { value }
    }

    #[inline]
    pub fn value(&self) -> f32 {
        self.value
    }

    fn set(&mut self, value: f32, out: &mut Emitter) {
        self.value = Self::INPUTS[Self::VALUE].clamp(value);
        out.emit(0, Control::Float(self.value));
    }
}

fn build(params: &Params<'_>) -> Kernel {
    Kernel::Control(ControlKernel::Slider(Slider::new(params.value(Slider::VALUE))))
}

impl ControlProcess for Slider {
    fn receive_control(&mut self, port: usize, control: Control, out: &mut Emitter) {
        if port == Self::VALUE {
            self.set(control.as_float(), out);
        }
    }

    fn feed(&mut self, control: Control, out: &mut Emitter) {
        self.set(control.as_float(), out);
    }
}
