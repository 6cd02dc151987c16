use crate::projector::Viewport;
use crate::scene::Color;

#[derive(Debug, Clone)]
pub struct Settings {
    pub title: String,
    /// Logical window size. The projection constants are derived from it.
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,
    pub background: Color,
    /// Enables the Khronos validation layer and forwards its messages to `log`.
    pub validation: bool,
    /// Circles per frame the surface can hold; the rest are dropped.
    pub max_circles: usize,
}

impl Settings {
    pub fn viewport(&self) -> Viewport {
        Viewport::for_size(self.width, self.height)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            title: String::from("3D Game"),
            width: 800,
            height: 600,
            frame_rate: 60,
            background: Color::rgb(20, 5, 35),
            validation: cfg!(debug_assertions),
            max_circles: 4096,
        }
    }
}
