//! Nodes, connections, and the topology edits that join them.
//!
//! A [`Node`] is shared between the editing context and the render context
//! through an `Arc`. The pieces each context touches are kept apart:
//!
//! - the inbound/outbound connection lists are published through
//!   [`ArcSwap`], so readers take a snapshot and never wait on an editor;
//! - editors serialize list changes on a per-node lock, always taken in
//!   ascending [`NodeId`] order;
//! - port values are atomic floats (last writer wins);
//! - an audio node's kernel and buffers are only touched by the render
//!   context. Control reactions reach it through a ring buffer.

use core::fmt;
use core::sync::atomic::Ordering;
use std::sync::{Arc, Weak};

use arc_swap::ArcSwap;
use dasp_graph::Buffer;
use parking_lot::{Mutex, MutexGuard};
use portable_atomic::{AtomicF32, AtomicI8, AtomicU64};
use rtrb::{Consumer, Producer, RingBuffer};
use tracing::debug;

use crate::config::EngineConfig;
use crate::control::Control;
use crate::nodes::{AudioKernel, ControlKernel, Kernel, WaveTable};
use crate::port::{self, PortInfo, Rate};
use crate::registry::{NodeManifest, Params};

/// Timestamp of the first sample of a frame, counted in samples.
pub type SampleTime = u64;

/// Stable identifier of a node within a graph.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Highlight state used by the editor. Has no effect on computation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Activation {
    Negative,
    #[default]
    Neutral,
    Positive,
}

impl Activation {
    fn to_i8(self) -> i8 {
        match self {
            Activation::Negative => -1,
            Activation::Neutral => 0,
            Activation::Positive => 1,
        }
    }

    fn from_i8(value: i8) -> Self {
        match value {
            v if v < 0 => Activation::Negative,
            0 => Activation::Neutral,
            _ => Activation::Positive,
        }
    }
}

pub(crate) type ConnectionList = ArcSwap<Vec<Arc<Connection>>>;

/// Render-side state of an audio node.
pub(crate) struct AudioState {
    pub(crate) kernel: AudioKernel,
    pub(crate) last_render: Option<SampleTime>,
    /// How many times the kernel has actually run.
    pub(crate) renders: u64,
    /// One persistent buffer per output port. Replayed for repeat pulls.
    pub(crate) outputs: Box<[Buffer]>,
    /// One staging buffer per input port.
    pub(crate) staging: Box<[Buffer]>,
    /// Audio-rate feeds per input port, recounted every frame.
    pub(crate) audio_feeds: Box<[usize]>,
    pub(crate) inbox: Consumer<(usize, Control)>,
}

pub(crate) struct AudioBody {
    pub(crate) state: Mutex<AudioState>,
    pub(crate) inbox: Mutex<Producer<(usize, Control)>>,
    /// Copies of `AudioState::last_render` / `renders` readable without the
    /// render lock. `NEVER_RENDERED` until the first frame.
    pub(crate) last_render: AtomicU64,
    pub(crate) renders: AtomicU64,
    /// Sample table of a waveform oscillator, shared with its kernel.
    pub(crate) table: Option<WaveTable>,
}

pub(crate) const NEVER_RENDERED: u64 = u64::MAX;

pub(crate) struct ControlBody {
    pub(crate) kernel: Mutex<ControlKernel>,
}

pub(crate) enum Body {
    Audio(AudioBody),
    Control(ControlBody),
}

/// A computation unit in the graph.
pub struct Node {
    id: NodeId,
    manifest: NodeManifest,
    values: Box<[AtomicF32]>,
    inbound: ConnectionList,
    outbound: ConnectionList,
    edit: Mutex<()>,
    activation: AtomicI8,
    pub(crate) body: Body,
}

impl Node {
    /// Build a node from its manifest. `values` holds one initial value per
    /// input port; missing entries take the port default.
    pub(crate) fn new(
        id: NodeId,
        manifest: NodeManifest,
        values: &[f32],
        config: &EngineConfig,
    ) -> Self {
        let initial: Vec<f32> = manifest
            .inputs
            .iter()
            .enumerate()
            .map(|(i, info)| values.get(i).map_or(info.default, |v| info.clamp(*v)))
            .collect();

        let body = match (manifest.build)(&Params::new(manifest.inputs, &initial)) {
            Kernel::Audio(kernel) => {
                let (producer, consumer) = RingBuffer::new(config.inbox_capacity());
                let table = match &kernel {
                    AudioKernel::Waveform(waveform) => Some(waveform.table()),
                    _ => None,
                };
                Body::Audio(AudioBody {
                    state: Mutex::new(AudioState {
                        kernel,
                        last_render: None,
                        renders: 0,
                        outputs: vec![Buffer::default(); manifest.outputs.len()].into_boxed_slice(),
                        staging: vec![Buffer::default(); manifest.inputs.len()].into_boxed_slice(),
                        audio_feeds: vec![0; manifest.inputs.len()].into_boxed_slice(),
                        inbox: consumer,
                    }),
                    inbox: Mutex::new(producer),
                    last_render: AtomicU64::new(NEVER_RENDERED),
                    renders: AtomicU64::new(0),
                    table,
                })
            }
            Kernel::Control(kernel) => Body::Control(ControlBody {
                kernel: Mutex::new(kernel),
            }),
        };

        Self {
            id,
            manifest,
            values: initial.into_iter().map(AtomicF32::new).collect(),
            inbound: ArcSwap::from_pointee(Vec::new()),
            outbound: ArcSwap::from_pointee(Vec::new()),
            edit: Mutex::new(()),
            activation: AtomicI8::new(Activation::Neutral.to_i8()),
            body,
        }
    }

    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The protocol governing this node: audio nodes are pulled, control
    /// nodes push. Fixed at construction.
    #[inline]
    pub fn rate(&self) -> Rate {
        match self.body {
            Body::Audio(_) => Rate::Audio,
            Body::Control(_) => Rate::Control,
        }
    }

    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.manifest.type_name
    }

    #[inline]
    pub fn manifest(&self) -> &NodeManifest {
        &self.manifest
    }

    #[inline]
    pub fn input_ports(&self) -> &'static [PortInfo] {
        self.manifest.inputs
    }

    #[inline]
    pub fn output_ports(&self) -> &'static [PortInfo] {
        self.manifest.outputs
    }

    #[inline]
    pub fn num_inputs(&self) -> usize {
        self.manifest.inputs.len()
    }

    #[inline]
    pub fn num_outputs(&self) -> usize {
        self.manifest.outputs.len()
    }

    pub fn input_index(&self, name: &str) -> Option<usize> {
        port::index_of(self.manifest.inputs, name)
    }

    /// Current held value of an input port.
    pub fn input_value(&self, port: usize) -> Option<f32> {
        self.values.get(port).map(|v| v.load(Ordering::Relaxed))
    }

    #[inline]
    pub(crate) fn load_input(&self, port: usize) -> f32 {
        self.values[port].load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn store_input(&self, port: usize, value: f32) {
        if let Some(slot) = self.values.get(port) {
            slot.store(value, Ordering::Relaxed);
        }
    }

    /// Snapshot of the connections feeding this node.
    #[inline]
    pub fn inbound(&self) -> Arc<Vec<Arc<Connection>>> {
        self.inbound.load_full()
    }

    /// Snapshot of the connections this node feeds.
    #[inline]
    pub fn outbound(&self) -> Arc<Vec<Arc<Connection>>> {
        self.outbound.load_full()
    }

    pub fn activation(&self) -> Activation {
        Activation::from_i8(self.activation.load(Ordering::Relaxed))
    }

    pub fn activate(&self, activation: Activation) {
        self.activation.store(activation.to_i8(), Ordering::Relaxed);
    }

    /// Timestamp of the last computed frame, if any.
    pub fn last_render_time(&self) -> Option<SampleTime> {
        match &self.body {
            Body::Audio(audio) => match audio.last_render.load(Ordering::Acquire) {
                NEVER_RENDERED => None,
                t => Some(t),
            },
            Body::Control(_) => None,
        }
    }

    /// How many frames this node has actually computed (cached replays are
    /// not counted).
    pub fn render_count(&self) -> u64 {
        match &self.body {
            Body::Audio(audio) => audio.renders.load(Ordering::Acquire),
            Body::Control(_) => 0,
        }
    }

    /// Current sample table of a `Waveform` node.
    pub fn waveform(&self) -> Option<Vec<f32>> {
        match &self.body {
            Body::Audio(AudioBody { table: Some(table), .. }) => Some(table.load().to_vec()),
            _ => None,
        }
    }

    /// Replace the sample table of a `Waveform` node. The render context
    /// picks it up on the next computed frame. Returns `false` for any
    /// other node, or for an empty table.
    pub fn set_waveform(&self, samples: &[f32]) -> bool {
        match &self.body {
            Body::Audio(AudioBody { table: Some(table), .. }) if !samples.is_empty() => {
                table.store(Arc::new(samples.to_vec()));
                true
            }
            _ => false,
        }
    }

    /// Run `f` against the control kernel under the node lock.
    /// Returns `None` for audio nodes.
    pub fn with_control<R>(&self, f: impl FnOnce(&mut ControlKernel) -> R) -> Option<R> {
        match &self.body {
            Body::Control(body) => Some(f(&mut body.kernel.lock())),
            Body::Audio(_) => None,
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("type", &self.manifest.type_name)
            .field("rate", &self.rate())
            .finish()
    }
}

/// A directed edge from an output port of one node to an input port of
/// another.
///
/// The source is held strongly so the render context can never reach a
/// freed producer; the destination is held weakly.
pub struct Connection {
    src: Arc<Node>,
    src_port: usize,
    dst: Weak<Node>,
    dst_id: NodeId,
    dst_port: usize,
    rate: Rate,
}

impl Connection {
    /// Describe an edge. The rate is taken from the source node. Nothing is
    /// linked until [`connect`] is called.
    pub fn new(src: &Arc<Node>, src_port: usize, dst: &Arc<Node>, dst_port: usize) -> Arc<Self> {
        Arc::new(Self {
            src: Arc::clone(src),
            src_port,
            dst: Arc::downgrade(dst),
            dst_id: dst.id(),
            dst_port,
            rate: src.rate(),
        })
    }

    #[inline]
    pub fn src(&self) -> &Arc<Node> {
        &self.src
    }

    #[inline]
    pub fn src_id(&self) -> NodeId {
        self.src.id()
    }

    #[inline]
    pub fn src_port(&self) -> usize {
        self.src_port
    }

    /// The destination, if it is still alive.
    #[inline]
    pub fn dst(&self) -> Option<Arc<Node>> {
        self.dst.upgrade()
    }

    #[inline]
    pub fn dst_id(&self) -> NodeId {
        self.dst_id
    }

    #[inline]
    pub fn dst_port(&self) -> usize {
        self.dst_port
    }

    #[inline]
    pub fn rate(&self) -> Rate {
        self.rate
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Connection({}:{} -> {}:{}, {:?})",
            self.src_id(),
            self.src_port,
            self.dst_id,
            self.dst_port,
            self.rate
        )
    }
}

/// Edit locks of one or two nodes, taken in ascending id order.
struct EditLocks<'a> {
    _first: MutexGuard<'a, ()>,
    _second: Option<MutexGuard<'a, ()>>,
}

impl<'a> EditLocks<'a> {
    fn acquire(a: &'a Node, b: Option<&'a Node>) -> Self {
        match b {
            Some(b) if b.id != a.id => {
                let (first, second) = if a.id < b.id { (a, b) } else { (b, a) };
                let _first = first.edit.lock();
                let _second = Some(second.edit.lock());
                Self { _first, _second }
            }
            _ => Self {
                _first: a.edit.lock(),
                _second: None,
            },
        }
    }
}

fn appended(list: &ConnectionList, connection: &Arc<Connection>) -> Vec<Arc<Connection>> {
    let current = list.load();
    let mut next = Vec::with_capacity(current.len() + 1);
    next.extend(current.iter().cloned());
    next.push(Arc::clone(connection));
    next
}

fn without(list: &ConnectionList, connection: &Arc<Connection>) -> Option<Vec<Arc<Connection>>> {
    let current = list.load();
    if !current.iter().any(|c| Arc::ptr_eq(c, connection)) {
        return None;
    }
    Some(
        current
            .iter()
            .filter(|c| !Arc::ptr_eq(c, connection))
            .cloned()
            .collect(),
    )
}

/// Link `connection` into its source's outbound list and its destination's
/// inbound list.
///
/// Assumes the edge was validated by the caller. Takes effect on the next
/// pull or push; no buffer is recomputed.
pub fn connect(connection: &Arc<Connection>) {
    let Some(dst) = connection.dst() else {
        return;
    };
    let src = connection.src();
    let _locks = EditLocks::acquire(src, Some(&*dst));

    src.outbound.store(Arc::new(appended(&src.outbound, connection)));
    dst.inbound.store(Arc::new(appended(&dst.inbound, connection)));
    debug!(?connection, "connected");
}

/// Unlink `connection` from both endpoint lists. Unlinking an edge that is
/// not linked does nothing.
pub fn disconnect(connection: &Arc<Connection>) {
    let src = connection.src();
    let dst = connection.dst();
    let _locks = EditLocks::acquire(src, dst.as_deref());

    let mut removed = false;
    if let Some(list) = without(&src.outbound, connection) {
        src.outbound.store(Arc::new(list));
        removed = true;
    }
    if let Some(dst) = &dst {
        if let Some(list) = without(&dst.inbound, connection) {
            dst.inbound.store(Arc::new(list));
            removed = true;
        }
    }
    if removed {
        debug!(?connection, "disconnected");
    }
}
