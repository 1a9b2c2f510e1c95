//! Push delivery of control values.
//!
//! A control value enters the graph at one node/port through
//! [`push_control`], [`feed`] or [`tick`], and is delivered synchronously
//! along that node's outbound connections. Delivery to:
//!
//! - a **level** port stores the clamped value into the port slot, where
//!   the next rendered frame picks it up;
//! - an **event** port of an audio node queues the control for its kernel,
//!   applied by the render context before the next computed frame;
//! - a **control** node runs its reaction under the node lock and routes
//!   whatever it emitted once the lock is released.
//!
//! Nothing here reports failure. Out-of-range ports are ignored, and
//! recursion deeper than [`EngineConfig::max_push_depth`] is cut off.
//!
//! Chains started by [`tick`] run on the render thread and never wait on a
//! lock: a node held elsewhere misses that delivery.

use tracing::{trace, warn};

use crate::config::EngineConfig;
use crate::control::Control;
use crate::node::{Body, Node, SampleTime};
use crate::nodes::{ControlProcess, TickContext};
use crate::port::Latch;

/// Thread a delivery chain runs on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Context {
    /// Editing or input thread; may wait on node locks.
    Edit,
    /// Render thread; only `try_lock`.
    Render,
}

/// Most controls a single reaction may emit.
pub const EMITTER_CAPACITY: usize = 16;

/// Controls produced by a control node during one reaction, tagged with
/// the output port they leave on.
#[derive(Debug, Default)]
pub struct Emitter {
    pending: heapless::Vec<(usize, Control), EMITTER_CAPACITY>,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `control` on output `port`. Dropped with a warning once the
    /// emitter is full.
    pub fn emit(&mut self, port: usize, control: Control) {
        if self.pending.push((port, control)).is_err() {
            warn!(port, ?control, "emitter full, control dropped");
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Take every queued control, in emission order.
    pub fn drain(&mut self) -> impl Iterator<Item = (usize, Control)> {
        core::mem::take(&mut self.pending).into_iter()
    }
}

/// Deliver `control` to input `port` of `node`, then on to everything
/// downstream of it.
pub fn push_control(node: &Node, port: usize, control: Control, config: &EngineConfig) {
    deliver(node, port, control, config, Context::Edit, 0);
}

/// Hand a value from an external source (sensor, input device) to a
/// control node. Audio nodes ignore it.
pub fn feed(node: &Node, control: Control, config: &EngineConfig) {
    let Body::Control(body) = &node.body else {
        return;
    };
    let mut out = Emitter::new();
    body.kernel.lock().feed(control, &mut out);
    route(node, &mut out, config, Context::Edit, 0);
}

/// Advance a control node's clock to `now`.
///
/// Returns `false` without waiting if the node is busy on another thread,
/// or if it is not a control node.
pub fn tick(node: &Node, now: SampleTime, config: &EngineConfig) -> bool {
    let Body::Control(body) = &node.body else {
        return false;
    };
    let Some(mut kernel) = body.kernel.try_lock() else {
        return false;
    };
    let mut out = Emitter::new();
    kernel.tick(
        &TickContext {
            now,
            sample_rate: config.sample_rate(),
        },
        &mut out,
    );
    drop(kernel);
    route(node, &mut out, config, Context::Render, 0);
    true
}

fn deliver(
    node: &Node,
    port: usize,
    control: Control,
    config: &EngineConfig,
    context: Context,
    depth: usize,
) {
    let Some(info) = node.input_ports().get(port) else {
        trace!(node = %node.id(), port, "control to missing port ignored");
        return;
    };
    if depth > config.max_push_depth() {
        warn!(node = %node.id(), depth, "control push too deep, dropped");
        return;
    }
    trace!(node = %node.id(), port, ?control, "deliver");

    match &node.body {
        Body::Audio(audio) => match info.latch {
            // staged from the slot, the kernel never sees it
            Latch::Level => node.store_input(port, info.clamp(control.as_float())),
            Latch::Event => {
                let inbox = match context {
                    Context::Edit => Some(audio.inbox.lock()),
                    Context::Render => audio.inbox.try_lock(),
                };
                let Some(mut inbox) = inbox else {
                    warn!(node = %node.id(), port, "control inbox busy, event dropped");
                    return;
                };
                if inbox.push((port, control)).is_err() {
                    warn!(node = %node.id(), port, "control inbox full, event dropped");
                }
            }
        },
        Body::Control(body) => {
            if info.latch == Latch::Level {
                node.store_input(port, info.clamp(control.as_float()));
            }
            let kernel = match context {
                Context::Edit => Some(body.kernel.lock()),
                Context::Render => body.kernel.try_lock(),
            };
            let Some(mut kernel) = kernel else {
                warn!(node = %node.id(), port, "control node busy, control dropped");
                return;
            };
            let mut out = Emitter::new();
            kernel.receive_control(port, control, &mut out);
            drop(kernel);
            route(node, &mut out, config, context, depth);
        }
    }
}

fn route(node: &Node, out: &mut Emitter, config: &EngineConfig, context: Context, depth: usize) {
    if out.is_empty() {
        return;
    }
    let outbound = node.outbound();
    for (src_port, control) in out.drain() {
        for connection in outbound.iter().filter(|c| c.src_port() == src_port) {
            if let Some(dst) = connection.dst() {
                deliver(&dst, connection.dst_port(), control, config, context, depth + 1);
            }
        }
    }
}
