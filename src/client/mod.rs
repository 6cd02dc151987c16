mod input;
mod window;

use crate::camera::Camera;
use crate::frame::{FrameLoop, LoopState};
use crate::projector::Projector;
use crate::scene::Scene;
use crate::settings::Settings;
use crate::vk::{GraphicsError, SurfaceCanvas};

pub fn run(settings: Settings) -> ! {
    let event_loop = winit::event_loop::EventLoop::new();
    let (window, canvas) = match open(&event_loop, &settings) {
        Ok(opened) => opened,
        Err(err) => {
            log::error!("{}", err);
            std::process::exit(1)
        }
    };
    // dropped before the window on exit
    let mut canvas = Some(canvas);

    let mut frame_loop = FrameLoop::new(
        Camera::default(),
        Scene::two_squares(),
        Projector::new(settings.viewport()),
        settings.background,
    );
    log::info!("viewing {} points", frame_loop.scene().len());

    window.run(event_loop, settings.frame_rate, move |window, state| {
        let surface = match canvas.as_mut() {
            Some(surface) => surface,
            None => return LoopState::Stopped,
        };
        surface.set_target_size(window.size().into());
        match frame_loop.step(state.drain_events(), surface) {
            Ok(frame) if frame.state == LoopState::Running => LoopState::Running,
            Ok(_) => {
                canvas = None;
                LoopState::Stopped
            }
            Err(err) => {
                log::error!("{}", err);
                canvas = None;
                std::process::exit(1)
            }
        }
    })
}

fn open(
    event_loop: &winit::event_loop::EventLoop<()>,
    settings: &Settings,
) -> Result<(window::ClientWindow, SurfaceCanvas), GraphicsError> {
    let window = window::ClientWindow::new(event_loop, settings)?;
    let canvas = SurfaceCanvas::new(window.window(), settings)?;
    Ok((window, canvas))
}
