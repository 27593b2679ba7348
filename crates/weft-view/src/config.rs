#![forbid(unsafe_code)]

//! Render-root configuration.

use weft_reactive::DEFAULT_MAX_MICROTASK_ROUNDS;

#[cfg(feature = "config")]
use crate::error::ConfigError;

/// Options for a [`RenderRoot`](crate::RenderRoot).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct RenderConfig {
    /// Tag used when a selector shorthand names none.
    pub default_tag: String,
    /// Queue child-list edits and flush them from a microtask. When off,
    /// each container op is applied to the tree immediately.
    pub batch_child_edits: bool,
    /// Feed external attribute changes back into live attribute bags.
    pub two_way_attributes: bool,
    /// Bound on microtask rounds per flush of the built-in scheduler.
    pub max_microtask_rounds: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            default_tag: String::from("div"),
            batch_child_edits: true,
            two_way_attributes: true,
            max_microtask_rounds: DEFAULT_MAX_MICROTASK_ROUNDS,
        }
    }
}

impl RenderConfig {
    #[must_use]
    pub fn with_default_tag(mut self, tag: impl Into<String>) -> Self {
        self.default_tag = tag.into();
        self
    }

    #[must_use]
    pub fn with_batch_child_edits(mut self, on: bool) -> Self {
        self.batch_child_edits = on;
        self
    }

    #[must_use]
    pub fn with_two_way_attributes(mut self, on: bool) -> Self {
        self.two_way_attributes = on;
        self
    }

    #[must_use]
    pub fn with_max_microtask_rounds(mut self, rounds: usize) -> Self {
        self.max_microtask_rounds = rounds;
        self
    }

    /// Parse a config from TOML. Missing keys take their defaults.
    #[cfg(feature = "config")]
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    #[cfg(feature = "config")]
    fn validate(&self) -> Result<(), ConfigError> {
        let tag_ok = !self.default_tag.is_empty()
            && self
                .default_tag
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-');
        if !tag_ok {
            return Err(ConfigError::Invalid {
                field: "default_tag",
                reason: format!("{:?} is not a tag name", self.default_tag),
            });
        }
        if self.max_microtask_rounds == 0 {
            return Err(ConfigError::Invalid {
                field: "max_microtask_rounds",
                reason: String::from("must be at least 1"),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = RenderConfig::default();
        assert_eq!(config.default_tag, "div");
        assert!(config.batch_child_edits);
        assert!(config.two_way_attributes);
    }

    #[test]
    fn builders_chain() {
        let config = RenderConfig::default()
            .with_default_tag("section")
            .with_batch_child_edits(false)
            .with_two_way_attributes(false)
            .with_max_microtask_rounds(3);
        assert_eq!(config.default_tag, "section");
        assert!(!config.batch_child_edits);
        assert!(!config.two_way_attributes);
        assert_eq!(config.max_microtask_rounds, 3);
    }
}
