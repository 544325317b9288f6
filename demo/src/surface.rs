//! A render surface without a real window, described by configuration.

use tickinput_core::{RenderSurface, WindowHandle, WindowMetrics};

use crate::config::WindowConfig;

pub struct HeadlessSurface {
    window: WindowConfig,
}

impl HeadlessSurface {
    pub fn new(window: WindowConfig) -> Self {
        Self { window }
    }
}

impl RenderSurface for HeadlessSurface {
    fn window_handle(&self) -> WindowHandle {
        WindowHandle(self.window.handle)
    }

    fn metrics(&self) -> WindowMetrics {
        WindowMetrics {
            width: self.window.width,
            height: self.window.height,
            depth: self.window.depth,
            left: self.window.left,
            top: self.window.top,
        }
    }
}
