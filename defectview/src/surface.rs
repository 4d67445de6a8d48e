//! Display sinks

use defectview_core::PixelBuffer;

/// Receives every rendered frame.
///
/// The engine hands over the frame and its display size; what happens to it
/// (upload to a texture, write to a file, discard) is up to the host.
pub trait RenderSurface {
    /// Take a rendered `width x height` frame.
    fn present(&mut self, frame: PixelBuffer, width: u32, height: u32);
}

/// Keeps the most recent frame
#[derive(Debug, Default, Clone)]
pub struct FrameSurface {
    frame: Option<PixelBuffer>,
    presented: u64,
}

impl FrameSurface {
    /// Create an empty surface.
    pub fn new() -> Self {
        Self::default()
    }

    /// The latest frame, if any.
    pub fn frame(&self) -> Option<&PixelBuffer> {
        self.frame.as_ref()
    }

    /// Remove and return the latest frame.
    pub fn take_frame(&mut self) -> Option<PixelBuffer> {
        self.frame.take()
    }

    /// Number of frames presented so far.
    pub fn presented(&self) -> u64 {
        self.presented
    }
}

impl RenderSurface for FrameSurface {
    fn present(&mut self, frame: PixelBuffer, _width: u32, _height: u32) {
        self.frame = Some(frame);
        self.presented += 1;
    }
}

/// Discards every frame
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSurface;

impl RenderSurface for NullSurface {
    fn present(&mut self, _frame: PixelBuffer, _width: u32, _height: u32) {}
}

impl<S: RenderSurface + ?Sized> RenderSurface for &mut S {
    fn present(&mut self, frame: PixelBuffer, width: u32, height: u32) {
        (**self).present(frame, width, height);
    }
}

impl<S: RenderSurface + ?Sized> RenderSurface for Box<S> {
    fn present(&mut self, frame: PixelBuffer, width: u32, height: u32) {
        (**self).present(frame, width, height);
    }
}
