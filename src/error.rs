//! Errors reported at the editing boundary.
//!
//! Nothing here is ever produced on the render path: the core treats bad
//! input there as a no-op and renders silence instead.

use thiserror::Error;

use crate::node::NodeId;
use crate::port::Rate;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("unknown node type `{0}`")]
    UnknownNodeType(String),

    #[error("node {0} does not exist")]
    UnknownNode(NodeId),

    #[error("node {node} has no {direction} port {port}")]
    PortOutOfRange {
        node: NodeId,
        port: usize,
        direction: &'static str,
    },

    #[error("input `{port}` of node {node} does not accept connections")]
    PortNotConnectable { node: NodeId, port: &'static str },

    #[error("cannot route a {from:?}-rate output into {to:?}-rate input `{port}`")]
    RateMismatch {
        from: Rate,
        to: Rate,
        port: &'static str,
    },

    #[error("node {src} port {src_port} is already connected to node {dst} port {dst_port}")]
    DuplicateConnection {
        src: NodeId,
        src_port: usize,
        dst: NodeId,
        dst_port: usize,
    },

    #[error("connecting node {src} to node {dst} would create a cycle")]
    Cycle { src: NodeId, dst: NodeId },

    #[error("node {0} is not an audio node and cannot be rendered")]
    NotAudioNode(NodeId),

    #[error("node {0} is not a composite")]
    NotComposite(NodeId),

    #[error("node {0} is not a waveform oscillator")]
    NotWaveform(NodeId),

    #[error("waveform of node {0} needs at least one sample")]
    EmptyWaveform(NodeId),

    #[error("node type `{type_name}` has no parameter `{name}`")]
    UnknownParam { type_name: &'static str, name: String },

    #[error("invalid graph document: {0}")]
    Document(#[from] serde_json::Error),

    #[error("invalid engine config: {0}")]
    Config(#[from] toml::de::Error),
}
