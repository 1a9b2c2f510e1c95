//! Node type catalog.
//!
//! Every node type is described by a [`NodeManifest`]: its name, its port
//! tables and a constructor. Manifests are plain `const` data, so a
//! registry is fully built the moment a type is registered and never
//! changes behind a shared reference afterwards.
//!
//! A [`NodeRegistry`] is an ordinary value owned by a [`Graph`](crate::Graph);
//! there is no process-wide catalog.

use core::fmt;

use hashbrown::HashMap;
use itertools::Itertools;

use crate::nodes::{self, Kernel};
use crate::port::{self, PortInfo, Rate};

/// Resolved initial port values handed to a node constructor.
pub struct Params<'a> {
    ports: &'static [PortInfo],
    values: &'a [f32],
}

impl<'a> Params<'a> {
    pub(crate) fn new(ports: &'static [PortInfo], values: &'a [f32]) -> Self {
        Self { ports, values }
    }

    /// Value of input port `port`, or its default if none was given.
    pub fn value(&self, port: usize) -> f32 {
        self.values
            .get(port)
            .copied()
            .or_else(|| self.ports.get(port).map(|p| p.default))
            .unwrap_or(0.0)
    }

    /// Value of the input port called `name`.
    pub fn get(&self, name: &str) -> Option<f32> {
        port::index_of(self.ports, name).map(|i| self.value(i))
    }
}

/// Static description of a node type.
#[derive(Clone, Copy)]
pub struct NodeManifest {
    /// Name used by documents and the editor.
    pub type_name: &'static str,
    pub description: &'static str,
    pub rate: Rate,
    pub inputs: &'static [PortInfo],
    pub outputs: &'static [PortInfo],
    pub build: fn(&Params<'_>) -> Kernel,
}

impl NodeManifest {
    pub fn input_index(&self, name: &str) -> Option<usize> {
        port::index_of(self.inputs, name)
    }

    /// Input ports shown in the node editor.
    pub fn edit_ports(&self) -> impl Iterator<Item = (usize, &'static PortInfo)> {
        let inputs = self.inputs;
        inputs.iter().enumerate().filter(|(_, p)| p.can_edit)
    }
}

impl fmt::Debug for NodeManifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeManifest")
            .field("type_name", &self.type_name)
            .field("rate", &self.rate)
            .field("inputs", &self.inputs.len())
            .field("outputs", &self.outputs.len())
            .finish()
    }
}

/// A catalog of node types, keyed by type name.
#[derive(Clone, Debug, Default)]
pub struct NodeRegistry {
    manifests: HashMap<&'static str, NodeManifest>,
}

impl NodeRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in node type.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        for manifest in nodes::BUILTIN {
            registry.register(*manifest);
        }
        registry
    }

    /// Add a node type, returning the manifest it replaced.
    pub fn register(&mut self, manifest: NodeManifest) -> Option<NodeManifest> {
        self.manifests.insert(manifest.type_name, manifest)
    }

    pub fn get(&self, type_name: &str) -> Option<&NodeManifest> {
        self.manifests.get(type_name)
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.manifests.contains_key(type_name)
    }

    /// Registered type names, sorted.
    pub fn type_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.manifests.keys().copied().sorted()
    }

    pub fn len(&self) -> usize {
        self.manifests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.manifests.is_empty()
    }
}
