//! Input configuration, loadable from YAML.

use crate::error::{InputError, InputResult};
use crate::listener::Propagation;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Which devices to acquire and how to dispatch their events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Acquire a keyboard on initialize.
    pub keyboard: bool,
    /// Acquire a mouse on initialize.
    pub mouse: bool,
    /// What a listener returning `false` does to the rest of the dispatch.
    pub propagation: Propagation,
    /// Capacity of the backend's per-device event queue.
    /// Events arriving while the queue is full are dropped.
    pub queue_capacity: usize,
    /// Extra session parameters. `WINDOW` is always taken from the surface.
    pub params: BTreeMap<String, String>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            keyboard: true,
            mouse: true,
            propagation: Propagation::Broadcast,
            queue_capacity: 1024,
            params: BTreeMap::new(),
        }
    }
}

impl InputConfig {
    /// Parse configuration from a YAML string.
    pub fn from_yaml_str(content: &str) -> InputResult<Self> {
        serde_yaml::from_str(content).map_err(|e| InputError::Config(e.to_string()))
    }

    /// Load configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> InputResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| InputError::Config(format!("{}: {e}", path.display())))?;
        Self::from_yaml_str(&content)
    }

    pub fn to_yaml_string(&self) -> InputResult<String> {
        serde_yaml::to_string(self).map_err(|e| InputError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = InputConfig::default();
        assert!(config.keyboard);
        assert!(config.mouse);
        assert_eq!(config.propagation, Propagation::Broadcast);
        assert_eq!(config.queue_capacity, 1024);
        assert!(config.params.is_empty());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config = InputConfig::from_yaml_str("mouse: false\n").unwrap();
        assert!(config.keyboard);
        assert!(!config.mouse);
        assert_eq!(config.queue_capacity, 1024);
    }

    #[test]
    fn test_full_yaml() {
        let yaml = r#"
keyboard: false
mouse: true
propagation: stop_on_false
queue_capacity: 64
params:
  x11_mouse_grab: "false"
  x11_keyboard_grab: "false"
"#;
        let config = InputConfig::from_yaml_str(yaml).unwrap();
        assert!(!config.keyboard);
        assert_eq!(config.propagation, Propagation::StopOnFalse);
        assert_eq!(config.queue_capacity, 64);
        assert_eq!(config.params.get("x11_mouse_grab").map(String::as_str), Some("false"));
        assert_eq!(config.params.len(), 2);
    }

    #[test]
    fn test_invalid_yaml_is_config_error() {
        let err = InputConfig::from_yaml_str("propagation: sometimes\n").unwrap_err();
        assert!(matches!(err, InputError::Config(_)));
    }

    #[test]
    fn test_yaml_roundtrip() {
        let mut config = InputConfig::default();
        config.propagation = Propagation::StopOnFalse;
        let yaml = config.to_yaml_string().unwrap();
        assert_eq!(InputConfig::from_yaml_str(&yaml).unwrap(), config);
    }

    #[test]
    fn test_load_missing_file() {
        let err = InputConfig::load("/nonexistent/tickinput.yaml").unwrap_err();
        assert!(matches!(err, InputError::Config(ref msg) if msg.contains("tickinput.yaml")));
    }
}
