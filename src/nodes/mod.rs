//! Built-in node kinds.
//!
//! Nodes are organized into two categories:
//!
//! ## Audio ([`audio`])
//!
//! Pulled once per frame by the render context:
//! - [`Sine`] - Sine oscillator
//! - [`SquareWave`] - Pulse oscillator with hard-sync phase input
//! - [`Waveform`] - Oscillator over a user-defined sample table
//! - [`Constant`] - DC source, also the plain control-to-audio bridge
//! - [`Gain`] - Multiplies its input
//! - [`Output`] - Sink node handed to the audio driver
//! - [`Composite`] - Sums a group of subnodes with its input
//!
//! ## Control ([`control`])
//!
//! Push discrete values to whatever they are connected to:
//! - [`Timer`] - Bangs at a fixed interval
//! - [`Sequencer`] - Step sequencer clocked by tempo
//! - [`Gesture`] - Emits touch/stylus fields fed by an input device
//! - [`Slider`] - Emits its value whenever it is edited
//! - [`Probe`] - Counts and forwards what it receives
//!
//! The set is closed: both kinds are enums dispatched through
//! [`AudioProcess`] and [`ControlProcess`], and each variant publishes its
//! [`NodeManifest`] for the [`NodeRegistry`](crate::NodeRegistry).

pub mod audio;
pub mod control;

use dasp_graph::Buffer;

use crate::control::Control;
use crate::node::SampleTime;
use crate::registry::NodeManifest;
use crate::router::Emitter;

pub use audio::{Composite, Constant, Gain, Output, Sine, SquareWave, WaveTable, Waveform};
pub use control::{Gesture, Probe, Sequencer, SequencerState, Slider, Timer};

/// Every built-in node type.
pub const BUILTIN: &[NodeManifest] = &[
    Sine::MANIFEST,
    SquareWave::MANIFEST,
    Waveform::MANIFEST,
    Constant::MANIFEST,
    Gain::MANIFEST,
    Output::MANIFEST,
    Composite::MANIFEST,
    Timer::MANIFEST,
    Sequencer::MANIFEST,
    Gesture::MANIFEST,
    Slider::MANIFEST,
    Probe::MANIFEST,
];

/// Information available while an audio kernel computes a frame.
#[derive(Clone, Copy, Debug)]
pub struct ProcessContext {
    /// Sample rate of the graph in Hz (e.g., 44100, 48000)
    pub sample_rate: u32,
    /// Samples in this frame (at most `Buffer::LEN`)
    pub buffer_size: usize,
}

/// The staged input signals of one frame.
///
/// Every input port has exactly one buffer: the sum of its audio-rate
/// feeds, or its held control value repeated across the frame.
pub struct InputFrame<'a> {
    buffers: &'a [Buffer],
    audio_feeds: &'a [usize],
    frames: usize,
}

impl<'a> InputFrame<'a> {
    pub fn new(buffers: &'a [Buffer], audio_feeds: &'a [usize], frames: usize) -> Self {
        Self {
            buffers,
            audio_feeds,
            frames: frames.min(Buffer::LEN),
        }
    }

    /// Samples staged for `port`. Empty if the port does not exist.
    #[inline]
    pub fn port(&self, port: usize) -> &'a [f32] {
        match self.buffers.get(port) {
            Some(buffer) => &buffer[..self.frames],
            None => &[],
        }
    }

    /// Number of audio-rate connections feeding `port` this frame.
    #[inline]
    pub fn audio_feeds(&self, port: usize) -> usize {
        self.audio_feeds.get(port).copied().unwrap_or(0)
    }

    #[inline]
    pub fn frames(&self) -> usize {
        self.frames
    }
}

/// Per-sample processing of an audio node.
pub trait AudioProcess {
    /// React to a control delivered to event input `port`. Runs on the
    /// render thread, right before the next frame is computed. Level ports
    /// only reach the kernel through the staged [`InputFrame`].
    fn receive_control(&mut self, port: usize, control: Control) {
        let _ = (port, control);
    }

    /// Compute one frame into `outputs`, one buffer per output port.
    /// Only the first `ctx.buffer_size` samples are read back.
    fn process(&mut self, ctx: &ProcessContext, inputs: &InputFrame<'_>, outputs: &mut [Buffer]);
}

#[enum_delegate::implement(AudioProcess,
    pub trait AudioProcess {
        fn receive_control(&mut self, port: usize, control: Control);
        fn process(&mut self, ctx: &ProcessContext, inputs: &InputFrame<'_>, outputs: &mut [Buffer]);
    }
)]
pub enum AudioKernel {
    Sine(Sine),
    SquareWave(SquareWave),
    Waveform(Waveform),
    Constant(Constant),
    Gain(Gain),
    Output(Output),
    Composite(Composite),
}

/// Clock reading handed to control sources.
#[derive(Clone, Copy, Debug)]
pub struct TickContext {
    pub now: SampleTime,
    pub sample_rate: u32,
}

/// Reactions of a control node. Anything written to the [`Emitter`] is
/// routed to the node's outbound connections once the node lock is
/// released.
pub trait ControlProcess {
    /// React to a control delivered to input `port`.
    fn receive_control(&mut self, port: usize, control: Control, out: &mut Emitter);

    /// Called once per callback by the driver's clock.
    fn tick(&mut self, ctx: &TickContext, out: &mut Emitter) {
        let _ = (ctx, out);
    }

    /// A value from an external source (sensor, input device).
    fn feed(&mut self, control: Control, out: &mut Emitter) {
        let _ = (control, out);
    }
}

#[enum_delegate::implement(ControlProcess,
    pub trait ControlProcess {
        fn receive_control(&mut self, port: usize, control: Control, out: &mut Emitter);
        fn tick(&mut self, ctx: &TickContext, out: &mut Emitter);
        fn feed(&mut self, control: Control, out: &mut Emitter);
    }
)]
pub enum ControlKernel {
    Timer(Timer),
    Sequencer(Sequencer),
    Gesture(Gesture),
    Slider(Slider),
    Probe(Probe),
}

/// What a [`NodeManifest`] constructor produces.
pub enum Kernel {
    Audio(AudioKernel),
    Control(ControlKernel),
}
