//! Engine configuration.

use serde::Deserialize;

use crate::error::GraphError;

/// Settings shared by every node of a [`Graph`](crate::Graph).
///
/// Build one with the `with_*` setters, or load it from TOML:
///
/// ```
/// # use nodewerk::EngineConfig;
/// let config = EngineConfig::from_toml_str("sample_rate = 44100").unwrap();
/// assert_eq!(config.sample_rate(), 44100);
/// assert_eq!(config.inbox_capacity(), 64);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    sample_rate: u32,
    /// Pending control reactions per audio node before new ones are dropped.
    inbox_capacity: usize,
    /// Deepest chain of audio pulls before a branch is rendered as silence.
    max_render_depth: usize,
    /// Deepest chain of control deliveries before routing stops.
    max_push_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            inbox_capacity: 64,
            max_render_depth: 64,
            max_push_depth: 64,
        }
    }
}

impl EngineConfig {
    pub fn new(sample_rate: u32) -> Self {
        Self::default().with_sample_rate(sample_rate)
    }

    /// Parse a TOML table. Missing keys take their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, GraphError> {
        let config: Self = toml::from_str(source)?;
        Ok(config.sanitized())
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate.max(1);
        self
    }

    pub fn with_inbox_capacity(mut self, capacity: usize) -> Self {
        self.inbox_capacity = capacity.max(1);
        self
    }

    pub fn with_max_render_depth(mut self, depth: usize) -> Self {
        self.max_render_depth = depth.max(1);
        self
    }

    pub fn with_max_push_depth(mut self, depth: usize) -> Self {
        self.max_push_depth = depth.max(1);
        self
    }

    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    #[inline]
    pub fn inbox_capacity(&self) -> usize {
        self.inbox_capacity
    }

    #[inline]
    pub fn max_render_depth(&self) -> usize {
        self.max_render_depth
    }

    #[inline]
    pub fn max_push_depth(&self) -> usize {
        self.max_push_depth
    }

    fn sanitized(self) -> Self {
        self.with_sample_rate(self.sample_rate)
            .with_inbox_capacity(self.inbox_capacity)
            .with_max_render_depth(self.max_render_depth)
            .with_max_push_depth(self.max_push_depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_overrides_and_defaults() {
        let config = EngineConfig::from_toml_str(
            "sample_rate = 96000\nmax_render_depth = 8\ninbox_capacity = 0\n",
        )
        .unwrap();
        assert_eq!(config.sample_rate(), 96_000);
        assert_eq!(config.max_render_depth(), 8);
        assert_eq!(config.inbox_capacity(), 1);
        assert_eq!(config.max_push_depth(), 64);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(
            EngineConfig::from_toml_str("channels = 2"),
            Err(GraphError::Config(_))
        ));
    }
}
