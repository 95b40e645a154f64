use crate::core::framebuffer::FrameBuffer;
use crate::ui::input::{CursorTracker, InputSample};
use minifb::{Key, MouseMode, WindowOptions};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WindowError {
    #[error("window creation failed: {0}")]
    InitFailed(#[from] minifb::Error),
}

/// OS window plus the ARGB staging buffer the framebuffer resolves into.
pub struct Window {
    inner: minifb::Window,
    width: usize,
    height: usize,
    buffer: Vec<u32>,
    cursor: CursorTracker,
}

impl Window {
    pub fn new(title: &str, width: usize, height: usize) -> Result<Self, WindowError> {
        let inner = minifb::Window::new(title, width, height, WindowOptions::default())?;
        Ok(Self {
            inner,
            width,
            height,
            buffer: vec![0u32; width * height],
            cursor: CursorTracker::default(),
        })
    }

    /// Closed by the OS, or Escape pressed.
    pub fn should_close(&self) -> bool {
        !self.inner.is_open() || self.inner.is_key_down(Key::Escape)
    }

    /// Samples keyboard, mouse, and scroll state for this frame.
    pub fn poll(&mut self) -> InputSample {
        let mouse_delta = match self.inner.get_mouse_pos(MouseMode::Pass) {
            Some((x, y)) => self.cursor.delta(x, y),
            None => (0.0, 0.0),
        };
        let scroll_delta = self
            .inner
            .get_scroll_wheel()
            .map(|(_, y)| y)
            .unwrap_or(0.0);

        InputSample {
            forward: self.inner.is_key_down(Key::W),
            back: self.inner.is_key_down(Key::S),
            left: self.inner.is_key_down(Key::A),
            right: self.inner.is_key_down(Key::D),
            mouse_delta,
            scroll_delta,
        }
    }

    /// Resolves the framebuffer to packed ARGB and pushes it to the screen.
    pub fn present(&mut self, framebuffer: &FrameBuffer) -> Result<(), WindowError> {
        framebuffer.resolve_argb(&mut self.buffer);
        self.inner
            .update_with_buffer(&self.buffer, self.width, self.height)?;
        Ok(())
    }

    pub fn set_title(&mut self, title: &str) {
        self.inner.set_title(title);
    }
}
