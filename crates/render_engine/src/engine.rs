//! Frame driver
//!
//! Owns the window, Vulkan context, and renderer, and runs the main loop:
//! poll events, advance the frame timer, let the scene update, then hand
//! its renderables to the renderer.

use log::{info, LevelFilter};
use thiserror::Error;

use crate::foundation::logging;
use crate::foundation::time::{FrameStats, FrameTimer};
use crate::render::renderer::{Renderer, RendererConfig};
use crate::render::vulkan::context::VulkanContext;
use crate::render::vulkan::window::{Window, WindowConfig, WindowError};
use crate::render::vulkan::VulkanError;
use crate::render::Renderable;

/// Engine-level errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// A subsystem failed during startup
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    /// The render backend reported an error mid-run
    #[error("Render error: {0}")]
    Render(#[from] VulkanError),

    /// The windowing layer reported an error mid-run
    #[error("Window error: {0}")]
    Window(#[from] WindowError),
}

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Application name passed to Vulkan and the window title
    pub app_name: String,
    /// Initial window width in screen coordinates
    pub window_width: u32,
    /// Initial window height in screen coordinates
    pub window_height: u32,
    /// Maximum level emitted by the engine logger
    pub log_level: LevelFilter,
    /// Renderer settings
    pub renderer: RendererConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            app_name: "Render Engine".to_string(),
            window_width: 1280,
            window_height: 720,
            log_level: LevelFilter::Info,
            renderer: RendererConfig::default(),
        }
    }
}

/// Per-tick hooks the application implements
pub trait Scene {
    /// Advance application state by one frame
    fn update(&mut self, stats: &FrameStats);

    /// Renderables to draw this frame, in draw order
    fn renderables(&self) -> &[Renderable];
}

/// Window, context, renderer, and the loop that drives them
pub struct Engine {
    renderer: Renderer,
    context: VulkanContext,
    window: Window,
    timer: FrameTimer,
}

impl Engine {
    /// Bring up logging, the window, the Vulkan context, and the renderer.
    /// Any failure aborts startup with a diagnostic error.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        logging::init_with_level(config.log_level);

        let window_config = WindowConfig {
            title: config.app_name.clone(),
            width: config.window_width,
            height: config.window_height,
            resizable: true,
        };
        let mut window = Window::new(&window_config)
            .map_err(|e| EngineError::InitializationFailed(format!("window: {e}")))?;

        let context = VulkanContext::new(&mut window, &config.app_name)
            .map_err(|e| EngineError::InitializationFailed(format!("vulkan context: {e}")))?;

        let renderer = Renderer::new(&context, config.renderer)
            .map_err(|e| EngineError::InitializationFailed(format!("renderer: {e}")))?;

        info!(
            "Engine initialized ({}x{}, {} frames in flight)",
            config.window_width,
            config.window_height,
            renderer.frames_in_flight()
        );

        Ok(Self {
            renderer,
            context,
            window,
            timer: FrameTimer::new(),
        })
    }

    /// Run the main loop until the window closes.
    pub fn run(&mut self, scene: &mut dyn Scene) -> Result<(), EngineError> {
        while !self.window.should_close() {
            self.window.poll_events();
            for _event in self.window.flush_events() {}

            // Skip rendering while minimized. The wait also ends on a
            // close request, which the loop condition picks up next.
            if self.window.is_minimized() {
                self.window.wait_while_minimized();
                continue;
            }

            let stats = self.timer.tick();
            scene.update(&stats);

            let size = self.window.framebuffer_size();
            self.renderer
                .render_frame(&mut self.context, scene.renderables(), size)?;
        }

        info!(
            "Main loop finished after {} frames",
            self.timer.stats().frame_count()
        );
        Ok(())
    }

    /// Vulkan context, for building resources against the device
    pub fn context(&self) -> &VulkanContext {
        &self.context
    }

    /// Renderer, for render-pass-compatible pipeline creation
    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Window, for input polling outside the run loop
    pub fn window_mut(&mut self) -> &mut Window {
        &mut self.window
    }

    /// Timing statistics from the most recent frame
    pub fn frame_stats(&self) -> FrameStats {
        self.timer.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_reasonable() {
        let config = EngineConfig::default();
        assert_eq!(config.window_width, 1280);
        assert_eq!(config.window_height, 720);
        assert_eq!(config.renderer.frames_in_flight, 2);
    }
}
