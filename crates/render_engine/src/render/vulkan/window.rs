//! Windowing layer
//!
//! Wraps GLFW behind a small surface: creation from a [`WindowConfig`],
//! event pumping, framebuffer size queries for swapchain sizing, and
//! Vulkan surface creation. Minimized windows report a zero framebuffer
//! size; [`Window::wait_while_minimized`] parks the thread until the
//! window is restored or closed.

use thiserror::Error;

/// Windowing layer errors
#[derive(Error, Debug)]
pub enum WindowError {
    /// GLFW itself could not be brought up
    #[error("GLFW initialization failed")]
    InitFailed,

    /// The window could not be created with the requested parameters
    #[error("window creation failed ({width}x{height})")]
    CreationFailed {
        /// Requested width in screen coordinates
        width: u32,
        /// Requested height in screen coordinates
        height: u32,
    },

    /// A GLFW query or surface call failed
    #[error("GLFW error: {0}")]
    Glfw(String),
}

/// Result type for windowing operations
pub type WindowResult<T> = Result<T, WindowError>;

/// Window creation parameters
#[derive(Debug, Clone)]
pub struct WindowConfig {
    /// Title bar text
    pub title: String,
    /// Initial width in screen coordinates
    pub width: u32,
    /// Initial height in screen coordinates
    pub height: u32,
    /// Whether the user may resize the window
    pub resizable: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Render Engine".to_string(),
            width: 1280,
            height: 720,
            resizable: true,
        }
    }
}

/// Whether a minimize wait may stop blocking. A close request always
/// ends the wait so shutdown is never stuck behind a 0x0 framebuffer.
fn minimize_wait_over(framebuffer_size: (u32, u32), close_requested: bool) -> bool {
    close_requested || (framebuffer_size.0 > 0 && framebuffer_size.1 > 0)
}

/// GLFW window plus its event receiver
pub struct Window {
    glfw: glfw::Glfw,
    window: glfw::PWindow,
    events: glfw::GlfwReceiver<(f64, glfw::WindowEvent)>,
}

impl Window {
    /// Create a window without an OpenGL context; the surface belongs to
    /// Vulkan.
    pub fn new(config: &WindowConfig) -> WindowResult<Self> {
        let mut glfw = glfw::init(glfw::fail_on_errors).map_err(|_| WindowError::InitFailed)?;

        glfw.window_hint(glfw::WindowHint::ClientApi(glfw::ClientApiHint::NoApi));
        glfw.window_hint(glfw::WindowHint::Resizable(config.resizable));

        let (mut window, events) = glfw
            .create_window(
                config.width,
                config.height,
                &config.title,
                glfw::WindowMode::Windowed,
            )
            .ok_or(WindowError::CreationFailed {
                width: config.width,
                height: config.height,
            })?;

        window.set_key_polling(true);
        window.set_close_polling(true);
        window.set_framebuffer_size_polling(true);

        Ok(Self {
            glfw,
            window,
            events,
        })
    }

    /// Pump the GLFW event queue.
    pub fn poll_events(&mut self) {
        self.glfw.poll_events();
    }

    /// Drain pending window events.
    pub fn flush_events(&self) -> glfw::FlushedMessages<(f64, glfw::WindowEvent)> {
        glfw::flush_messages(&self.events)
    }

    /// Whether the user has requested the window close
    pub fn should_close(&self) -> bool {
        self.window.should_close()
    }

    /// Request the window close.
    pub fn set_should_close(&mut self, should_close: bool) {
        self.window.set_should_close(should_close);
    }

    /// Framebuffer size in pixels; (0, 0) while minimized
    pub fn framebuffer_size(&self) -> (u32, u32) {
        let (width, height) = self.window.get_framebuffer_size();
        (width as u32, height as u32)
    }

    /// Whether the framebuffer currently has no renderable area
    pub fn is_minimized(&self) -> bool {
        self.framebuffer_size() == (0, 0)
    }

    /// Block until the window is restored or a close is requested.
    pub fn wait_while_minimized(&mut self) {
        while !minimize_wait_over(self.framebuffer_size(), self.window.should_close()) {
            self.glfw.wait_events();
        }
    }

    /// Instance extensions GLFW needs for surface creation
    pub fn required_instance_extensions(&self) -> WindowResult<Vec<String>> {
        self.glfw
            .get_required_instance_extensions()
            .ok_or_else(|| WindowError::Glfw("no instance extensions for this platform".to_string()))
    }

    /// Create a Vulkan surface for this window.
    pub fn create_vulkan_surface(
        &mut self,
        instance: ash::vk::Instance,
    ) -> WindowResult<ash::vk::SurfaceKHR> {
        let mut surface = ash::vk::SurfaceKHR::null();
        match self
            .window
            .create_window_surface(instance, std::ptr::null(), &mut surface)
        {
            ash::vk::Result::SUCCESS => Ok(surface),
            result => Err(WindowError::Glfw(format!(
                "surface creation returned {result:?}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimize_wait_ends_when_restored() {
        assert!(!minimize_wait_over((0, 0), false));
        assert!(minimize_wait_over((1280, 720), false));
    }

    #[test]
    fn close_request_ends_minimize_wait() {
        assert!(minimize_wait_over((0, 0), true));
    }

    #[test]
    fn partial_size_still_counts_as_minimized() {
        assert!(!minimize_wait_over((1280, 0), false));
        assert!(!minimize_wait_over((0, 720), false));
    }
}
