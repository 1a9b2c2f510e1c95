//! Tempo-clocked step sequencer

use crate::control::Control;
use crate::node::SampleTime;
use crate::nodes::{ControlKernel, ControlProcess, Kernel, TickContext};
use crate::port::{PortInfo, Rate};
use crate::registry::{NodeManifest, Params};
use crate::router::Emitter;

use super::seconds_to_samples;

const LANES: usize = 4;

/// Where the sequencer is in its step cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SequencerState {
    /// Waiting for the next interval to elapse.
    #[default]
    Idle,
    /// A manual advance was requested; it is taken on the next tick.
    Armed,
    /// Emitting the values of the new step.
    Advancing,
}

/// A step sequencer with [`Sequencer::LANES`] parallel lanes.
///
/// Each clock tick compares the time since the last advance against
/// `60 / bpm` seconds. Once crossed, the step index moves forward (modulo
/// the step count) and every lane emits its value for that step on its own
/// output. A control on `advance` steps immediately on the next tick.
pub struct Sequencer {
    sequence: Vec<[f32; LANES]>,
    position: Option<usize>,
    bpm: f32,
    state: SequencerState,
    last_advance: Option<SampleTime>,
}

impl Sequencer {
    pub const LANES: usize = LANES;

    pub const ADVANCE: usize = 0;
    pub const BPM: usize = 1;
    pub const STEPS: usize = 2;

    const INPUTS: [PortInfo; 3] = [
        PortInfo::new("advance", 0.0)
            .control()
            .event()
            .connect_only()
            .doc("Step forward on the next tick."),
        PortInfo::new("bpm", 120.0)
            .range(1.0, 999.0)
            .control()
            .doc("Steps per minute."),
        PortInfo::new("steps", 8.0)
            .range(1.0, 64.0)
            .control()
            .edit_only()
            .doc("Number of steps in the sequence."),
    ];

    const OUTPUTS: [PortInfo; LANES] = [
        PortInfo::new("seq1", 0.0).control().connect_only(),
        PortInfo::new("seq2", 0.0).control().connect_only(),
        PortInfo::new("seq3", 0.0).control().connect_only(),
        PortInfo::new("seq4", 0.0).control().connect_only(),
    ];

    pub const MANIFEST: NodeManifest = NodeManifest {
        type_name: "Sequencer",
        description: "Step sequencer clocked by tempo.",
        rate: Rate::Control,
        inputs: &Self::INPUTS,
        outputs: &Self::OUTPUTS,
        build,
    };

    pub fn new(num_steps: usize, bpm: f32) -> Self {
        Self {
            sequence: vec![[0.0; Self::LANES]; num_steps.max(1)],
            position: None,
            bpm: Self::INPUTS[Self::BPM].clamp(bpm),
            state: SequencerState::Idle,
            last_advance: None,
        }
    }

    /// Index of the step emitted last. Step 0 before the first advance.
    pub fn current_step(&self) -> usize {
        self.position.unwrap_or(0)
    }

    #[inline]
    pub fn num_sequences(&self) -> usize {
        Self::LANES
    }

    #[inline]
    pub fn num_steps(&self) -> usize {
        self.sequence.len()
    }

    /// Resize the sequence. New steps start at zero.
    pub fn set_num_steps(&mut self, num_steps: usize) {
        let num_steps = num_steps.clamp(1, Self::INPUTS[Self::STEPS].max as usize);
        self.sequence.resize(num_steps, [0.0; Self::LANES]);
        if let Some(position) = self.position {
            if position >= num_steps {
                self.position = Some(num_steps - 1);
            }
        }
    }

    /// Out-of-range indices are ignored.
    pub fn set_step_value(&mut self, seq: usize, step: usize, value: f32) {
        if let Some(lane) = self.sequence.get_mut(step).and_then(|s| s.get_mut(seq)) {
            *lane = value;
        }
    }

    pub fn step_value(&self, seq: usize, step: usize) -> Option<f32> {
        self.sequence.get(step).and_then(|s| s.get(seq)).copied()
    }

    #[inline]
    pub fn bpm(&self) -> f32 {
        self.bpm
    }

    pub fn set_bpm(&mut self, bpm: f32) {
        self.bpm = Self::INPUTS[Self::BPM].clamp(bpm);
    }

    #[inline]
    pub fn state(&self) -> SequencerState {
        self.state
    }

    /// Copy of the step grid, one row per step.
    pub fn steps(&self) -> Vec<[f32; LANES]> {
        self.sequence.clone()
    }

    /// Step `at` moves to the next step and emits it.
    fn advance(&mut self, at: SampleTime, out: &mut Emitter) {
        self.state = SequencerState::Advancing;
        let n = self.sequence.len();
        let position = self.position.map_or(0, |p| (p + 1) % n);
        self.position = Some(position);
        for (lane, value) in self.sequence[position].iter().enumerate() {
            out.emit(lane, Control::Float(*value));
        }
        self.last_advance = Some(at);
        self.state = SequencerState::Idle;
    }
}

fn build(params: &Params<'_>) -> Kernel {
    let steps = params.value(Sequencer::STEPS) as usize;
    let bpm = params.value(Sequencer::BPM);
    Kernel::Control(ControlKernel::Sequencer(Sequencer::new(steps, bpm)))
}

impl ControlProcess for Sequencer {
    fn receive_control(&mut self, port: usize, control: Control, _out: &mut Emitter) {
        match port {
            Self::ADVANCE => self.state = SequencerState::Armed,
            Self::BPM => self.set_bpm(control.as_float()),
            Self::STEPS => self.set_num_steps(control.as_float() as usize),
            _ => {}
        }
    }

    fn tick(&mut self, ctx: &TickContext, out: &mut Emitter) {
        if self.state == SequencerState::Armed {
            self.advance(ctx.now, out);
            return;
        }

        let Some(last) = self.last_advance else {
            self.last_advance = Some(ctx.now);
            return;
        };

        let interval = seconds_to_samples(60.0 / self.bpm, ctx.sample_rate);
        let elapsed = ctx.now.saturating_sub(last);
        if elapsed >= interval {
            // stay on the tempo grid unless more than a step behind
            let at = if elapsed >= 2 * interval { ctx.now } else { last + interval };
            self.advance(at, out);
        }
    }
}
