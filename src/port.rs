//! Port descriptors.
//!
//! Every node type publishes a static table of [`PortInfo`]s for its inputs
//! and outputs. The tables are built once, when the type is registered, and
//! shared read-only by every instance of that type.

use serde::{Deserialize, Serialize};

/// The rate a signal is produced or consumed at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rate {
    /// One value per sample, recomputed every frame.
    Audio,
    /// Discrete values delivered whenever they are produced.
    Control,
}

/// How a control value delivered to an input port persists.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Latch {
    /// The value is held until the next delivery and upsampled across
    /// every frame rendered in between.
    Level,
    /// The value is handed to the node exactly once and never upsampled.
    /// Used for one-shot reactions such as phase resets or step advances.
    Event,
}

/// Static description of one input or output slot of a node type.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PortInfo {
    pub name: &'static str,
    pub default: f32,
    pub min: f32,
    pub max: f32,
    /// Whether a connection may be made to this port.
    pub can_connect: bool,
    /// Whether the port shows up in the node's editor.
    pub can_edit: bool,
    /// Highest rate this port accepts. An `Audio` port also accepts
    /// control-rate feeds (held across the frame); a `Control` port only
    /// accepts control-rate feeds.
    pub rate: Rate,
    pub latch: Latch,
    pub doc: &'static str,
}

impl PortInfo {
    /// An audio-rate, connectable, editable, unbounded level port.
    pub const fn new(name: &'static str, default: f32) -> Self {
        Self {
            name,
            default,
            min: f32::MIN,
            max: f32::MAX,
            can_connect: true,
            can_edit: true,
            rate: Rate::Audio,
            latch: Latch::Level,
            doc: "",
        }
    }

    pub const fn range(self, min: f32, max: f32) -> Self {
        Self { min, max, ..self }
    }

    /// Only accept control-rate feeds.
    pub const fn control(self) -> Self {
        Self { rate: Rate::Control, ..self }
    }

    /// Deliver controls once instead of holding them.
    pub const fn event(self) -> Self {
        Self { latch: Latch::Event, ..self }
    }

    /// Editable in the node editor, but not a connection target.
    pub const fn edit_only(self) -> Self {
        Self { can_connect: false, ..self }
    }

    /// A connection target that does not appear in the node editor.
    pub const fn connect_only(self) -> Self {
        Self { can_edit: false, ..self }
    }

    /// Wired by the engine itself: neither a connection target nor shown
    /// in the node editor.
    pub const fn internal(self) -> Self {
        Self {
            can_connect: false,
            can_edit: false,
            ..self
        }
    }

    pub const fn doc(self, doc: &'static str) -> Self {
        Self { doc, ..self }
    }

    /// Clamp `value` into this port's range.
    #[inline]
    pub fn clamp(&self, value: f32) -> f32 {
        if value.is_nan() {
            return self.default;
        }
        value.max(self.min).min(self.max)
    }

    /// Whether a feed produced at `rate` may be routed into this port.
    #[inline]
    pub fn accepts(&self, rate: Rate) -> bool {
        match (self.rate, rate) {
            (Rate::Control, Rate::Audio) => false,
            _ => self.can_connect,
        }
    }
}

/// Find the index of the port called `name`.
pub fn index_of(ports: &[PortInfo], name: &str) -> Option<usize> {
    ports.iter().position(|p| p.name == name)
}
