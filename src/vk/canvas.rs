use super::swapchain::has_area;
use super::{CircleInstance, CircleRenderer, GraphicsError, Instance, Swapchain};
use crate::frame::Canvas;
use crate::scene::Color;
use crate::settings::Settings;
use std::sync::Arc;

/// Window surface exposed to the frame loop. Circles are batched between
/// `clear` and `present` and drawn in one instanced call.
pub struct SurfaceCanvas {
    renderer: CircleRenderer,
    swapchain: Swapchain,
    instance: Arc<Instance>,

    target_size: (u32, u32),
    clear_color: Color,
    circles: Vec<CircleInstance>,
}

impl SurfaceCanvas {
    pub fn new(window: &winit::window::Window, settings: &Settings) -> Result<Self, GraphicsError> {
        let instance = Instance::new(window, settings.validation)?;
        let target_size = window.inner_size().into();
        let swapchain = Swapchain::new(instance.clone(), target_size)?;
        let renderer = CircleRenderer::new(
            instance.clone(),
            &swapchain,
            settings.max_circles,
            [settings.width as f32, settings.height as f32],
        )?;

        Ok(Self {
            renderer,
            swapchain,
            instance,

            target_size,
            clear_color: settings.background,
            circles: Vec::with_capacity(settings.max_circles),
        })
    }

    /// Size used the next time the swapchain has to be rebuilt.
    pub fn set_target_size(&mut self, size: (u32, u32)) {
        self.target_size = size
    }

    fn encode(&self, color: Color) -> [f32; 3] {
        if self.swapchain.is_srgb() {
            color.to_linear()
        } else {
            color.to_unorm()
        }
    }

    fn rebuild(&mut self) -> Result<(), GraphicsError> {
        if self.swapchain.rebuild(self.target_size)? {
            self.renderer.rebuild(&self.swapchain)?;
        }
        Ok(())
    }
}

impl Canvas for SurfaceCanvas {
    type Error = GraphicsError;

    fn clear(&mut self, color: Color) {
        self.clear_color = color;
        self.circles.clear()
    }

    fn fill_circle(&mut self, x: i32, y: i32, radius: i32, color: Color) {
        // zero-radius circles of far away points are not drawn
        if radius < 1 {
            return;
        }
        let color = self.encode(color);
        self.circles.push(CircleInstance {
            center: [x as f32 + 0.5, y as f32 + 0.5],
            radius: radius as f32,
            color,
        })
    }

    fn present(&mut self) -> Result<(), GraphicsError> {
        // minimized: nothing to show until the window comes back
        if !has_area(self.target_size) {
            return Ok(());
        }
        let [r, g, b] = self.encode(self.clear_color);
        let renderer = &mut self.renderer;
        let circles = &self.circles;
        let presented = self
            .swapchain
            .render([r, g, b, 1.0], |command_buffer, frame| {
                renderer.record(command_buffer, frame, circles)
            })?;
        if !presented {
            self.rebuild()?;
        }
        Ok(())
    }
}

impl Drop for SurfaceCanvas {
    fn drop(&mut self) {
        if let Err(err) = self.instance.wait_idle() {
            log::error!("device did not go idle before teardown: {}", err)
        }
    }
}
