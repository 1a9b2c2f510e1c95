//! Graph - the editing context and its render driver

use std::sync::Arc;

use arc_swap::ArcSwap;
use dasp_graph::Buffer;
use delegate::delegate;
use hashbrown::HashMap;
use itertools::Itertools;
use petgraph::algo::has_path_connecting;
use petgraph::graphmap::DiGraphMap;
use tracing::debug;

use crate::config::EngineConfig;
use crate::control::Control;
use crate::error::GraphError;
use crate::node::{self, Connection, Node, NodeId, SampleTime};
use crate::nodes::{Composite, ControlKernel, Sequencer};
use crate::port::Rate;
use crate::registry::NodeRegistry;
use crate::render::{render_audio, RenderContext};
use crate::router;

/// State shared between a [`Graph`] and its [`Renderer`]s.
struct Shared {
    config: EngineConfig,
    /// Audio nodes rendered every callback.
    sinks: ArcSwap<Vec<Arc<Node>>>,
    /// Control nodes ticked every callback.
    clocked: ArcSwap<Vec<Arc<Node>>>,
}

/// The editing side of a node graph.
///
/// `Graph` owns every node, validates edits before they reach the core
/// (port ranges, rates, duplicates, cycles), and keeps track of the sink
/// nodes. The render side is a [`Renderer`], handed to the audio thread.
///
/// ```
/// # use nodewerk::{EngineConfig, Graph};
/// let mut graph = Graph::with_standard_nodes(EngineConfig::new(48_000));
/// let sine = graph.add_node("SineWave", &[("freq", 440.0)]).unwrap();
/// let out = graph.add_node("Output", &[]).unwrap();
/// graph.connect(sine, 0, out, 0).unwrap();
/// graph.add_sink(out).unwrap();
///
/// let mut renderer = graph.renderer();
/// let mut block = [0.0; 256];
/// renderer.process(&mut block);
/// ```
pub struct Graph {
    shared: Arc<Shared>,
    registry: NodeRegistry,
    nodes: HashMap<NodeId, Arc<Node>>,
    next_node_id: u32,
}

impl Graph {
    pub fn new(config: EngineConfig, registry: NodeRegistry) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                sinks: ArcSwap::from_pointee(Vec::new()),
                clocked: ArcSwap::from_pointee(Vec::new()),
            }),
            registry,
            nodes: HashMap::new(),
            next_node_id: 0,
        }
    }

    /// A graph that knows every built-in node type.
    pub fn with_standard_nodes(config: EngineConfig) -> Self {
        Self::new(config, NodeRegistry::standard())
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.shared.config
    }

    #[inline]
    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    /// Create a node of `type_name`. Ports not named in `params` take their
    /// defaults; named values are clamped to the port range.
    pub fn add_node(&mut self, type_name: &str, params: &[(&str, f32)]) -> Result<NodeId, GraphError> {
        let manifest = *self
            .registry
            .get(type_name)
            .ok_or_else(|| GraphError::UnknownNodeType(type_name.to_owned()))?;

        let mut values: Vec<f32> = manifest.inputs.iter().map(|p| p.default).collect();
        for (name, value) in params {
            let index = manifest.input_index(name).ok_or_else(|| GraphError::UnknownParam {
                type_name: manifest.type_name,
                name: (*name).to_owned(),
            })?;
            values[index] = *value;
        }

        let id = NodeId(self.next_node_id);
        self.next_node_id += 1;

        let node = Arc::new(Node::new(id, manifest, &values, &self.shared.config));
        if node.rate() == Rate::Control {
            let mut clocked = self.shared.clocked.load().to_vec();
            clocked.push(Arc::clone(&node));
            self.shared.clocked.store(Arc::new(clocked));
        }
        self.nodes.insert(id, node);

        debug!(%id, type_name = manifest.type_name, "node added");
        Ok(id)
    }

    /// Disconnect every connection of node `id` and drop it from the graph.
    pub fn remove_node(&mut self, id: NodeId) -> Result<(), GraphError> {
        let node = self.nodes.remove(&id).ok_or(GraphError::UnknownNode(id))?;

        for connection in node.inbound().iter().chain(node.outbound().iter()) {
            node::disconnect(connection);
        }
        remove_from(&self.shared.sinks, id);
        remove_from(&self.shared.clocked, id);

        debug!(%id, "node removed");
        Ok(())
    }

    pub fn node(&self, id: NodeId) -> Option<&Arc<Node>> {
        self.nodes.get(&id)
    }

    /// Every node, in creation order.
    pub fn nodes(&self) -> impl Iterator<Item = &Arc<Node>> + '_ {
        self.nodes.values().sorted_by_key(|n| n.id())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn get(&self, id: NodeId) -> Result<&Arc<Node>, GraphError> {
        self.nodes.get(&id).ok_or(GraphError::UnknownNode(id))
    }

    /// Connect output `src_port` of `src` to input `dst_port` of `dst`.
    ///
    /// Fails if either port does not exist, the input does not accept
    /// connections or the source's rate, the same edge already exists, or
    /// the edge would close a cycle.
    pub fn connect(
        &mut self,
        src: NodeId,
        src_port: usize,
        dst: NodeId,
        dst_port: usize,
    ) -> Result<Arc<Connection>, GraphError> {
        self.link(src, src_port, dst, dst_port, Link::Public)
    }

    fn link(
        &self,
        src: NodeId,
        src_port: usize,
        dst: NodeId,
        dst_port: usize,
        link: Link,
    ) -> Result<Arc<Connection>, GraphError> {
        let src_node = self.get(src)?;
        let dst_node = self.get(dst)?;

        if src_port >= src_node.num_outputs() {
            return Err(GraphError::PortOutOfRange {
                node: src,
                port: src_port,
                direction: "output",
            });
        }
        let Some(info) = dst_node.input_ports().get(dst_port) else {
            return Err(GraphError::PortOutOfRange {
                node: dst,
                port: dst_port,
                direction: "input",
            });
        };
        if link == Link::Public && !info.can_connect {
            return Err(GraphError::PortNotConnectable {
                node: dst,
                port: info.name,
            });
        }
        let control_only = info.rate == Rate::Control || dst_node.rate() == Rate::Control;
        if control_only && src_node.rate() == Rate::Audio {
            return Err(GraphError::RateMismatch {
                from: src_node.rate(),
                to: info.rate,
                port: info.name,
            });
        }
        let duplicate = dst_node
            .inbound()
            .iter()
            .any(|c| c.src_id() == src && c.src_port() == src_port && c.dst_port() == dst_port);
        if duplicate {
            return Err(GraphError::DuplicateConnection {
                src,
                src_port,
                dst,
                dst_port,
            });
        }
        if src == dst || has_path_connecting(&self.topology(), dst, src, None) {
            return Err(GraphError::Cycle { src, dst });
        }

        let connection = Connection::new(src_node, src_port, dst_node, dst_port);
        node::connect(&connection);
        Ok(connection)
    }

    /// Unlink `connection`. Does nothing if it is not linked.
    pub fn disconnect(&mut self, connection: &Arc<Connection>) {
        node::disconnect(connection);
    }

    /// Unlink the edge between the given ports, if there is one.
    pub fn disconnect_ports(&mut self, src: NodeId, src_port: usize, dst: NodeId, dst_port: usize) -> bool {
        match self.find_connection(src, src_port, dst, dst_port) {
            Some(connection) => {
                node::disconnect(&connection);
                true
            }
            None => false,
        }
    }

    pub fn find_connection(
        &self,
        src: NodeId,
        src_port: usize,
        dst: NodeId,
        dst_port: usize,
    ) -> Option<Arc<Connection>> {
        let node = self.nodes.get(&src)?;
        let outbound = node.outbound();
        outbound
            .iter()
            .find(|c| c.src_port() == src_port && c.dst_id() == dst && c.dst_port() == dst_port)
            .cloned()
    }

    /// Every linked connection, ordered by source then destination.
    pub fn connections(&self) -> Vec<Arc<Connection>> {
        self.nodes
            .values()
            .flat_map(|n| n.outbound().iter().cloned().collect::<Vec<_>>())
            .sorted_by_key(|c| (c.src_id(), c.src_port(), c.dst_id(), c.dst_port()))
            .collect()
    }

    /// The node graph as a petgraph map. Edges carry the connection rate;
    /// parallel connections between two nodes collapse into one edge.
    pub fn topology(&self) -> DiGraphMap<NodeId, Rate> {
        let mut topology = DiGraphMap::with_capacity(self.nodes.len(), self.nodes.len());
        for id in self.nodes.keys() {
            topology.add_node(*id);
        }
        for node in self.nodes.values() {
            for connection in node.outbound().iter() {
                topology.add_edge(connection.src_id(), connection.dst_id(), connection.rate());
            }
        }
        topology
    }

    /// Render node `id` every callback.
    pub fn add_sink(&mut self, id: NodeId) -> Result<(), GraphError> {
        let node = self.get(id)?;
        if node.rate() != Rate::Audio {
            return Err(GraphError::NotAudioNode(id));
        }
        let sinks = self.shared.sinks.load();
        if !sinks.iter().any(|n| n.id() == id) {
            let mut next = sinks.to_vec();
            next.push(Arc::clone(node));
            self.shared.sinks.store(Arc::new(next));
        }
        Ok(())
    }

    pub fn remove_sink(&mut self, id: NodeId) -> bool {
        remove_from(&self.shared.sinks, id)
    }

    pub fn sinks(&self) -> Vec<NodeId> {
        self.shared.sinks.load().iter().map(|n| n.id()).collect()
    }

    pub fn is_sink(&self, id: NodeId) -> bool {
        self.shared.sinks.load().iter().any(|n| n.id() == id)
    }

    /// Deliver `control` to input `port` of node `id` and everything
    /// downstream of it. An out-of-range port is ignored.
    pub fn push_control(&self, id: NodeId, port: usize, control: Control) -> Result<(), GraphError> {
        let node = self.get(id)?;
        router::push_control(node, port, control, &self.shared.config);
        Ok(())
    }

    /// Edit the input port called `name`. The value is clamped to the port
    /// range and pushed like any other control.
    pub fn set_input(&self, id: NodeId, name: &str, value: f32) -> Result<(), GraphError> {
        let node = self.get(id)?;
        let port = node.input_index(name).ok_or_else(|| GraphError::UnknownParam {
            type_name: node.type_name(),
            name: name.to_owned(),
        })?;
        let value = node.input_ports()[port].clamp(value);
        router::push_control(node, port, Control::Float(value), &self.shared.config);
        Ok(())
    }

    /// Hand an external value (sensor, input device) to control node `id`.
    pub fn feed(&self, id: NodeId, control: Control) -> Result<(), GraphError> {
        let node = self.get(id)?;
        router::feed(node, control, &self.shared.config);
        Ok(())
    }

    /// Run `f` against the kernel of control node `id` under its lock.
    pub fn with_control<R>(&self, id: NodeId, f: impl FnOnce(&mut ControlKernel) -> R) -> Option<R> {
        self.nodes.get(&id)?.with_control(f)
    }

    /// Run `f` against sequencer `id` under its lock.
    pub fn with_sequencer<R>(&self, id: NodeId, f: impl FnOnce(&mut Sequencer) -> R) -> Option<R> {
        self.with_control(id, |kernel| match kernel {
            ControlKernel::Sequencer(seq) => Some(f(seq)),
            _ => None,
        })
        .flatten()
    }

    fn composite(&self, id: NodeId) -> Result<&Arc<Node>, GraphError> {
        let node = self.get(id)?;
        if node.type_name() != Composite::MANIFEST.type_name {
            return Err(GraphError::NotComposite(id));
        }
        Ok(node)
    }

    /// Make audio node `sub` part of `composite`: its output is mixed into
    /// the composite's output.
    pub fn add_subnode(&mut self, composite: NodeId, sub: NodeId) -> Result<Arc<Connection>, GraphError> {
        self.composite(composite)?;
        if self.get(sub)?.rate() != Rate::Audio {
            return Err(GraphError::NotAudioNode(sub));
        }
        let connection = self.link(sub, 0, composite, Composite::SUBNODES, Link::Subnode)?;
        debug!(%composite, %sub, "subnode added");
        Ok(connection)
    }

    /// Detach `sub` from `composite`. The node itself stays in the graph.
    pub fn remove_subnode(&mut self, composite: NodeId, sub: NodeId) -> bool {
        self.disconnect_ports(sub, 0, composite, Composite::SUBNODES)
    }

    /// Subnodes of `composite`, in id order.
    pub fn subnodes(&self, composite: NodeId) -> Result<Vec<NodeId>, GraphError> {
        let node = self.composite(composite)?;
        Ok(node
            .inbound()
            .iter()
            .filter(|c| c.dst_port() == Composite::SUBNODES)
            .map(|c| c.src_id())
            .sorted()
            .collect())
    }

    /// Replace the sample table of waveform node `id`.
    pub fn set_waveform(&self, id: NodeId, samples: &[f32]) -> Result<(), GraphError> {
        let node = self.get(id)?;
        if node.waveform().is_none() {
            return Err(GraphError::NotWaveform(id));
        }
        if !node.set_waveform(samples) {
            return Err(GraphError::EmptyWaveform(id));
        }
        Ok(())
    }

    /// A render driver for this graph. Sinks and clocked nodes added later
    /// are picked up on the next callback.
    pub fn renderer(&self) -> Renderer {
        Renderer {
            shared: Arc::clone(&self.shared),
            ctx: RenderContext::new(&self.shared.config),
            clock: 0,
            scratch: Buffer::default(),
        }
    }
}

impl Drop for Graph {
    /// Connections hold their source node, so linked nodes keep each other
    /// alive until every edge is unlinked. Renderers still running render
    /// silence afterwards.
    fn drop(&mut self) {
        self.shared.sinks.store(Arc::new(Vec::new()));
        self.shared.clocked.store(Arc::new(Vec::new()));
        for node in self.nodes.values() {
            for connection in node.outbound().iter() {
                node::disconnect(connection);
            }
        }
    }
}

/// How an edge was requested.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Link {
    /// Through [`Graph::connect`]; the input must be connectable.
    Public,
    /// Composite membership, into a hidden port.
    Subnode,
}

fn remove_from(list: &ArcSwap<Vec<Arc<Node>>>, id: NodeId) -> bool {
    let current = list.load();
    if !current.iter().any(|n| n.id() == id) {
        return false;
    }
    let next = current.iter().filter(|n| n.id() != id).cloned().collect();
    list.store(Arc::new(next));
    true
}

/// Drives a [`Graph`] from the audio thread.
///
/// Every call to [`process`](Self::process) ticks the clocked control
/// nodes, renders every sink in `Buffer::LEN`-sample frames and advances
/// the sample clock.
pub struct Renderer {
    shared: Arc<Shared>,
    ctx: RenderContext,
    clock: SampleTime,
    scratch: Buffer,
}

impl Renderer {
    delegate! {
        to self.ctx {
            pub fn sample_rate(&self) -> u32;
        }
    }

    /// Timestamp of the next frame to render.
    #[inline]
    pub fn clock(&self) -> SampleTime {
        self.clock
    }

    /// Tick every clocked control node at `now`.
    pub fn tick(&self, now: SampleTime) {
        for node in self.shared.clocked.load().iter() {
            router::tick(node, now, &self.shared.config);
        }
    }

    /// Overwrite `out` with the mix of every sink, starting at timestamp
    /// `t`. Does not tick or move the clock.
    pub fn render_block(&self, t: SampleTime, out: &mut [f32]) {
        out.fill(0.0);
        let sinks = self.shared.sinks.load();
        for (i, frame) in out.chunks_mut(Buffer::LEN).enumerate() {
            let t = t + (i * Buffer::LEN) as SampleTime;
            for sink in sinks.iter() {
                render_audio(sink, t, frame, 0, &self.ctx);
            }
        }
    }

    /// Fill a mono buffer and advance the clock past it.
    pub fn process(&mut self, out: &mut [f32]) {
        for frame in out.chunks_mut(Buffer::LEN) {
            self.tick(self.clock);
            self.render_block(self.clock, frame);
            self.clock += frame.len() as SampleTime;
        }
    }

    /// Fill an interleaved buffer of `channels` channels, writing the mono
    /// mix to every channel.
    pub fn process_interleaved(&mut self, out: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        for block in out.chunks_mut(Buffer::LEN * channels) {
            let frames = block.len() / channels;
            let mut scratch = core::mem::take(&mut self.scratch);
            self.tick(self.clock);
            self.render_block(self.clock, &mut scratch[..frames]);
            for (frame, sample) in block.chunks_exact_mut(channels).zip(scratch.iter()) {
                frame.fill(*sample);
            }
            self.scratch = scratch;
            self.clock += frames as SampleTime;
        }
    }
}
