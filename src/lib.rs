//! # nodewerk
//!
//! A node-based audio/control dataflow engine.
//!
//! Audio nodes are **pulled**: once per callback the driver asks each sink
//! for a frame, and every node computes its frame at most once per
//! timestamp, however many consumers it feeds. Control nodes **push**:
//! whenever one produces a value it is delivered along its outbound
//! connections right away. A control value landing on an audio input is
//! held across every sample of the following frames.
//!
//! ## Quick Start
//!
//! ```
//! use nodewerk::{EngineConfig, Graph};
//!
//! let mut graph = Graph::with_standard_nodes(EngineConfig::new(48_000));
//!
//! let osc = graph.add_node("SquareWave", &[("freq", 110.0)]).unwrap();
//! let slider = graph.add_node("Slider", &[]).unwrap();
//! let out = graph.add_node("Output", &[("gain", 0.5)]).unwrap();
//!
//! graph.connect(osc, 0, out, 0).unwrap();
//! graph.connect(slider, 0, osc, 0).unwrap(); // slider drives the frequency
//! graph.add_sink(out).unwrap();
//!
//! let mut renderer = graph.renderer();
//! let mut block = vec![0.0; 512];
//! renderer.process(&mut block);
//!
//! graph.set_input(slider, "value", 220.0).unwrap();
//! renderer.process(&mut block);
//! ```
//!
//! ## Threads
//!
//! A [`Graph`] is the editing side and a [`Renderer`] the audio side; both
//! may run at the same time. Topology edits are published atomically and
//! the render path never waits on an editor. See [`node`] for the details.

pub mod config;
pub mod control;
pub mod document;
pub mod error;
pub mod graph;
pub mod node;
pub mod nodes;
pub mod port;
pub mod registry;
pub mod render;
pub mod router;

pub use config::EngineConfig;
pub use control::{Control, ControlVector};
pub use document::{ConnectionRecord, GraphDocument, NodeRecord};
pub use error::GraphError;
pub use graph::{Graph, Renderer};
pub use node::{connect, disconnect, Activation, Connection, Node, NodeId, SampleTime};
pub use nodes::{AudioKernel, ControlKernel};
pub use port::{Latch, PortInfo, Rate};
pub use registry::{NodeManifest, NodeRegistry, Params};
pub use render::{render_audio, RenderContext};
pub use router::{push_control, Emitter};
