//! Control values - the discrete, non-periodic data carried by control-rate
//! connections.

/// Maximum number of lanes in a [`ControlVector`].
pub const CONTROL_VECTOR_LANES: usize = 8;

/// A fixed-capacity list of floats, for multi-field controls such as a
/// gesture (x, y, pressure, tilt, rotation).
///
/// Stored inline so a [`Control`] can be copied on every delivery without
/// touching the allocator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControlVector {
    values: [f32; CONTROL_VECTOR_LANES],
    len: u8,
}

impl ControlVector {
    /// Build from a slice. Lanes past [`CONTROL_VECTOR_LANES`] are dropped.
    pub fn from_slice(values: &[f32]) -> Self {
        let len = values.len().min(CONTROL_VECTOR_LANES);
        let mut lanes = [0.0; CONTROL_VECTOR_LANES];
        lanes[..len].copy_from_slice(&values[..len]);
        Self { values: lanes, len: len as u8 }
    }

    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.values[..self.len as usize]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn get(&self, lane: usize) -> Option<f32> {
        self.as_slice().get(lane).copied()
    }
}

/// A control value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Control {
    /// A trigger with no payload.
    Bang,
    Int(i32),
    Float(f32),
    Vector(ControlVector),
}

impl Control {
    /// Collapse to a single float. `Bang` reads as `1.0`, a vector as its
    /// first lane.
    pub fn as_float(&self) -> f32 {
        match self {
            Control::Bang => 1.0,
            Control::Int(i) => *i as f32,
            Control::Float(f) => *f,
            Control::Vector(v) => v.get(0).unwrap_or(0.0),
        }
    }

    pub fn vector(values: &[f32]) -> Self {
        Control::Vector(ControlVector::from_slice(values))
    }
}

impl From<f32> for Control {
    fn from(value: f32) -> Self {
        Control::Float(value)
    }
}

impl From<i32> for Control {
    fn from(value: i32) -> Self {
        Control::Int(value)
    }
}
