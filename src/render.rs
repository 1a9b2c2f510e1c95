//! The pull render protocol.
//!
//! [`render_audio`] asks an audio node for one frame of an output port at a
//! timestamp. The node computes the frame at most once per timestamp: it
//! stages every input port (pulling its audio-rate feeds recursively, or
//! holding its control value), runs its kernel, and keeps the result. Any
//! further request for the same or an older timestamp replays the kept
//! frame. Results are always *added* into the caller's buffer, so a port
//! with several feeds ends up holding their sum.

use core::sync::atomic::Ordering;

use dasp_graph::Buffer;
use tracing::warn;

use crate::config::EngineConfig;
use crate::node::{AudioState, Body, Node, SampleTime};
use crate::nodes::{AudioProcess, InputFrame, ProcessContext};
use crate::port::{Latch, Rate};

/// Render-side settings shared by every pull of one callback.
#[derive(Clone, Copy, Debug)]
pub struct RenderContext {
    sample_rate: u32,
    max_depth: usize,
}

impl RenderContext {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            sample_rate: config.sample_rate(),
            max_depth: config.max_render_depth(),
        }
    }

    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// Mix output `port` of `node` for the frame starting at `t` into `output`.
///
/// At most `Buffer::LEN` samples are written. Control nodes, missing
/// ports, and nodes that are already being rendered further up the same
/// pull (a cycle) contribute nothing.
pub fn render_audio(
    node: &Node,
    t: SampleTime,
    output: &mut [f32],
    port: usize,
    ctx: &RenderContext,
) {
    pull(node, t, output, port, ctx, 0);
}

fn pull(
    node: &Node,
    t: SampleTime,
    output: &mut [f32],
    port: usize,
    ctx: &RenderContext,
    depth: usize,
) {
    let Body::Audio(audio) = &node.body else {
        return;
    };
    if depth > ctx.max_depth {
        warn!(node = %node.id(), depth, "render too deep, contributing silence");
        return;
    }
    let Some(mut guard) = audio.state.try_lock() else {
        warn!(node = %node.id(), "node re-entered while rendering, contributing silence");
        return;
    };
    let state: &mut AudioState = &mut guard;
    if port >= state.outputs.len() {
        return;
    }

    let frames = output.len().min(Buffer::LEN);
    if state.last_render.map_or(true, |last| t > last) {
        state.last_render = Some(t);
        state.renders += 1;
        audio.last_render.store(t, Ordering::Release);
        audio.renders.store(state.renders, Ordering::Release);
        compute(node, state, t, frames, ctx, depth);
    }

    for (out, sample) in output[..frames].iter_mut().zip(state.outputs[port].iter()) {
        *out += *sample;
    }
}

fn compute(
    node: &Node,
    state: &mut AudioState,
    t: SampleTime,
    frames: usize,
    ctx: &RenderContext,
    depth: usize,
) {
    let ports = node.input_ports();
    let inbound = node.inbound();

    state.audio_feeds.fill(0);
    for connection in inbound.iter().filter(|c| c.rate() == Rate::Audio) {
        if let Some(feeds) = state.audio_feeds.get_mut(connection.dst_port()) {
            *feeds += 1;
        }
    }

    // audio feeds take precedence over events on the same port
    while let Ok((port, control)) = state.inbox.pop() {
        if state.audio_feeds.get(port).is_some_and(|n| *n == 0) {
            state.kernel.receive_control(port, control);
        }
    }

    for (i, info) in ports.iter().enumerate() {
        let staging = &mut state.staging[i];
        if state.audio_feeds[i] > 0 {
            staging.fill(0.0);
            let feeds = inbound
                .iter()
                .filter(|c| c.rate() == Rate::Audio && c.dst_port() == i);
            for connection in feeds {
                pull(
                    connection.src(),
                    t,
                    &mut staging[..frames],
                    connection.src_port(),
                    ctx,
                    depth + 1,
                );
            }
        } else {
            let held = match info.latch {
                Latch::Level => node.load_input(i),
                Latch::Event => info.default,
            };
            staging.fill(held);
        }
    }

    let process_ctx = ProcessContext {
        sample_rate: ctx.sample_rate,
        buffer_size: frames,
    };
    let inputs = InputFrame::new(&state.staging, &state.audio_feeds, frames);
    state.kernel.process(&process_ctx, &inputs, &mut state.outputs);
}
