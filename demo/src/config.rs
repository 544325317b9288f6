//! Demo configuration loaded from YAML.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tickinput_core::InputConfig;
use tickinput_platform::{WINDOW_LEFT_PARAM, WINDOW_TOP_PARAM};

/// The window input is reported against.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub handle: usize,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub left: i32,
    pub top: i32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            handle: 0,
            width: 1280,
            height: 720,
            depth: 32,
            left: 0,
            top: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub input: InputConfig,
    pub window: WindowConfig,
    /// Poll interval in milliseconds.
    pub tick_ms: u64,
    /// Stop after this long; run until Escape when unset.
    pub run_for_ms: Option<u64>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            input: InputConfig::default(),
            window: WindowConfig::default(),
            tick_ms: 16,
            run_for_ms: None,
        }
    }
}

impl DemoConfig {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Input configuration with the window origin added as session parameters.
    pub fn session_config(&self) -> InputConfig {
        let mut input = self.input.clone();
        input
            .params
            .insert(WINDOW_LEFT_PARAM.into(), self.window.left.to_string());
        input
            .params
            .insert(WINDOW_TOP_PARAM.into(), self.window.top.to_string());
        input
    }
}
