//! Saved graphs.
//!
//! A [`GraphDocument`] is the minimal state needed to rebuild a graph:
//! every node's type and port values, which nodes are sinks, the
//! connection triples, and the content a node is edited with beyond its
//! ports (sequencer step grids, waveform tables, composite members).
//! Runtime state (oscillator phases, sequencer position, buffers) is not
//! saved.

use std::collections::BTreeMap;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::GraphError;
use crate::graph::Graph;
use crate::node::NodeId;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub connections: Vec<ConnectionRecord>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Identifier local to the document.
    pub id: u32,
    #[serde(rename = "type")]
    pub type_name: String,
    /// Port name to value.
    #[serde(default)]
    pub params: BTreeMap<String, f32>,
    #[serde(default)]
    pub sink: bool,
    /// Sequencer step grid, one row per step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<Vec<Vec<f32>>>,
    /// Waveform sample table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waveform: Option<Vec<f32>>,
    /// Document ids of a composite's subnodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnodes: Option<Vec<u32>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionRecord {
    pub src: u32,
    pub src_port: usize,
    pub dst: u32,
    pub dst_port: usize,
}

impl GraphDocument {
    pub fn from_json(source: &str) -> Result<Self, GraphError> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn to_json(&self) -> Result<String, GraphError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Graph {
    /// Snapshot the graph. Document ids are the node ids.
    pub fn to_document(&self) -> GraphDocument {
        let nodes = self
            .nodes()
            .map(|node| NodeRecord {
                id: node.id().index(),
                type_name: node.type_name().to_owned(),
                params: node
                    .manifest()
                    .edit_ports()
                    .filter_map(|(i, port)| Some((port.name.to_owned(), node.input_value(i)?)))
                    .collect(),
                sink: self.is_sink(node.id()),
                sequence: self.with_sequencer(node.id(), |seq| {
                    seq.steps().iter().map(|step| step.to_vec()).collect()
                }),
                waveform: node.waveform(),
                subnodes: self
                    .subnodes(node.id())
                    .ok()
                    .map(|ids| ids.iter().map(|id| id.index()).collect()),
            })
            .collect();

        // subnode links are restored from `subnodes`
        let connections = self
            .connections()
            .iter()
            .filter(|c| {
                self.node(c.dst_id())
                    .and_then(|dst| dst.input_ports().get(c.dst_port()))
                    .is_some_and(|port| port.can_connect)
            })
            .map(|c| ConnectionRecord {
                src: c.src_id().index(),
                src_port: c.src_port(),
                dst: c.dst_id().index(),
                dst_port: c.dst_port(),
            })
            .collect();

        GraphDocument { nodes, connections }
    }

    /// Add every node of `document` to this graph, then connect them.
    ///
    /// Returns the mapping from document ids to the new node ids. Stops at
    /// the first invalid node or connection; whatever was added before it
    /// stays in the graph.
    pub fn load_document(&mut self, document: &GraphDocument) -> Result<HashMap<u32, NodeId>, GraphError> {
        let mut ids = HashMap::with_capacity(document.nodes.len());

        for record in &document.nodes {
            let params: Vec<(&str, f32)> = record.params.iter().map(|(k, v)| (k.as_str(), *v)).collect();
            let id = self.add_node(&record.type_name, &params)?;
            if record.sink {
                self.add_sink(id)?;
            }
            if let Some(sequence) = &record.sequence {
                self.with_sequencer(id, |seq| {
                    seq.set_num_steps(sequence.len());
                    for (step, values) in sequence.iter().enumerate() {
                        for (lane, value) in values.iter().enumerate() {
                            seq.set_step_value(lane, step, *value);
                        }
                    }
                });
            }
            if let Some(samples) = &record.waveform {
                self.set_waveform(id, samples)?;
            }
            ids.insert(record.id, id);
        }

        let lookup = |doc_id: u32| ids.get(&doc_id).copied().ok_or(GraphError::UnknownNode(NodeId(doc_id)));

        for record in &document.connections {
            let src = lookup(record.src)?;
            let dst = lookup(record.dst)?;
            self.connect(src, record.src_port, dst, record.dst_port)?;
        }

        for record in &document.nodes {
            let Some(subnodes) = &record.subnodes else {
                continue;
            };
            let composite = lookup(record.id)?;
            for sub in subnodes {
                self.add_subnode(composite, lookup(*sub)?)?;
            }
        }

        debug!(
            nodes = document.nodes.len(),
            connections = document.connections.len(),
            "document loaded"
        );
        Ok(ids)
    }
}
