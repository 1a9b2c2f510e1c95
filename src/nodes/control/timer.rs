//! Fixed-interval trigger

use crate::control::Control;
use crate::node::SampleTime;
use crate::nodes::{ControlKernel, ControlProcess, Kernel, TickContext};
use crate::port::{PortInfo, Rate};
use crate::registry::{NodeManifest, Params};
use crate::router::Emitter;

use super::seconds_to_samples;

/// Emits a [`Control::Bang`] every `interval` seconds of clock time.
///
/// The first tick only sets the reference point. A clock that jumps ahead
/// by several intervals produces a single bang and resynchronizes.
pub struct Timer {
    interval: f32,
    last_fire: Option<SampleTime>,
    fired: u64,
}

impl Timer {
    pub const INTERVAL: usize = 0;

    const INPUTS: [PortInfo; 1] = [PortInfo::new("interval", 0.5)
        .range(0.001, 3600.0)
        .control()
        .doc("Seconds between bangs.")];

    const OUTPUTS: [PortInfo; 1] = [PortInfo::new("bang", 0.0).control().connect_only()];

    pub const MANIFEST: NodeManifest = NodeManifest {
        type_name: "Timer",
        description: "Bangs at a fixed interval.",
        rate: Rate::Control,
        inputs: &Self::INPUTS,
        outputs: &Self::OUTPUTS,
        build,
    };

    pub fn new(interval: f32) -> Self {
        Self {
            interval: Self::INPUTS[Self::INTERVAL].clamp(interval),
            last_fire: None,
            fired: 0,
        }
    }

    #[inline]
    pub fn interval(&self) -> f32 {
        self.interval
    }

    /// Number of bangs emitted so far.
    #[inline]
    pub fn fired(&self) -> u64 {
        self.fired
    }
}

fn build(params: &Params<'_>) -> Kernel {
    Kernel::Control(ControlKernel::Timer(Timer::new(params.value(Timer::INTERVAL))))
}

impl ControlProcess for Timer {
    fn receive_control(&mut self, port: usize, control: Control, _out: &mut Emitter) {
        if port == Self::INTERVAL {
            self.interval = Self::INPUTS[Self::INTERVAL].clamp(control.as_float());
        }
    }

    fn tick(&mut self, ctx: &TickContext, out: &mut Emitter) {
        let Some(last) = self.last_fire else {
            self.last_fire = Some(ctx.now);
            return;
        };

        let period = seconds_to_samples(self.interval, ctx.sample_rate);
        let elapsed = ctx.now.saturating_sub(last);
        if elapsed < period {
            return;
        }

        out.emit(0, Control::Bang);
        self.fired += 1;
        self.last_fire = Some(if elapsed >= 2 * period {
            ctx.now
        } else {
            last + period
        });
    }
}
