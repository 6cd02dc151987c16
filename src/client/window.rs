use super::input::KeyState;
use crate::frame::{FramePacer, InputEvent, LoopState};
use crate::settings::Settings;
use std::collections::VecDeque;
use std::time::Instant;
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};

pub struct ClientWindow {
    window: winit::window::Window,
}

/// Input gathered between frames.
pub struct ClientState {
    events: VecDeque<InputEvent>,
    keys: KeyState,
    pacer: FramePacer,
    frame_count: u64,
}

impl ClientWindow {
    pub fn new(
        event_loop: &EventLoop<()>,
        settings: &Settings,
    ) -> Result<Self, winit::error::OsError> {
        let window = winit::window::WindowBuilder::new()
            .with_inner_size(winit::dpi::LogicalSize::new(settings.width, settings.height))
            .with_title(&settings.title)
            .with_resizable(false)
            .build(event_loop)?;

        Ok(Self { window })
    }

    pub fn window(&self) -> &winit::window::Window {
        &self.window
    }

    pub fn size(&self) -> winit::dpi::PhysicalSize<u32> {
        self.window.inner_size()
    }

    /// Queues input as it arrives and calls `on_frame` at most `frame_rate`
    /// times per second. Between frames the loop sleeps until the next
    /// deadline or the next event, whichever comes first.
    pub fn run<Fn: 'static + FnMut(&Self, &mut ClientState) -> LoopState>(
        self,
        event_loop: EventLoop<()>,
        frame_rate: u32,
        mut on_frame: Fn,
    ) -> ! {
        let mut state = ClientState::new(frame_rate, Instant::now());
        event_loop.run(move |event, _, control_flow| {
            if *control_flow == ControlFlow::Exit {
                return;
            }
            let main = matches!(event, Event::MainEventsCleared);
            state.handle_event(event);
            if !main {
                return;
            }

            let now = Instant::now();
            if state.pacer.is_due(now) {
                state.pacer.tick(now);
                state.frame_count += 1;
                if on_frame(&self, &mut state) == LoopState::Stopped {
                    log::debug!("stopping after {} frames", state.frame_count);
                    *control_flow = ControlFlow::Exit;
                    return;
                }
            }
            *control_flow = ControlFlow::WaitUntil(state.pacer.deadline())
        })
    }
}

impl ClientState {
    pub fn new(frame_rate: u32, now: Instant) -> Self {
        Self {
            events: VecDeque::new(),
            keys: KeyState::new(),
            pacer: FramePacer::new(frame_rate, now),
            frame_count: 0,
        }
    }

    pub fn handle_event(&mut self, event: Event<()>) {
        let event = match event {
            Event::WindowEvent { event, .. } => event,
            _ => return,
        };
        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                self.events.push_back(InputEvent::Close)
            }
            WindowEvent::KeyboardInput { input, .. } => {
                if let Some(keycode) = input.virtual_keycode {
                    self.events.extend(self.keys.transition(keycode, input.state))
                }
            }
            WindowEvent::Focused(false) => {
                let released = self.keys.release_all();
                self.events.extend(released)
            }
            _ => (),
        }
    }

    /// Hands the queued input to the frame loop, oldest first.
    pub fn drain_events(&mut self) -> std::collections::vec_deque::Drain<'_, InputEvent> {
        self.events.drain(..)
    }

    #[cfg(test)]
    pub fn pending_events(&self) -> usize {
        self.events.len()
    }
}
