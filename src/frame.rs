use crate::camera::{Axis, Camera};
use crate::projector::Projector;
use crate::scene::{Color, Scene};
use std::time::{Duration, Instant};

/// Logical key controls, independent of the physical binding.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Control {
    Forward,
    Backward,
    StrafeLeft,
    StrafeRight,
    TurnLeft,
    TurnRight,
    Quit,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum InputEvent {
    Pressed(Control),
    Released(Control),
    /// Window close request.
    Close,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LoopState {
    Running,
    Stopped,
}

/// Display surface the frame loop draws into.
pub trait Canvas {
    type Error;

    fn clear(&mut self, color: Color);
    fn fill_circle(&mut self, x: i32, y: i32, radius: i32, color: Color);
    fn present(&mut self) -> Result<(), Self::Error>;
}

/// Outcome of one loop iteration.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Frame {
    pub state: LoopState,
    pub drawn: usize,
    pub culled: usize,
}

impl Control {
    fn apply(self, camera: &mut Camera, factor: f32) {
        match self {
            Control::Forward => camera.apply_movement_input(Axis::Forward, factor),
            Control::Backward => camera.apply_movement_input(Axis::Forward, -factor),
            Control::StrafeRight => camera.apply_movement_input(Axis::Strafe, factor),
            Control::StrafeLeft => camera.apply_movement_input(Axis::Strafe, -factor),
            Control::TurnRight => camera.apply_turn_input(factor),
            Control::TurnLeft => camera.apply_turn_input(-factor),
            Control::Quit => (),
        }
    }
}

pub struct FrameLoop {
    camera: Camera,
    scene: Scene,
    projector: Projector,
    background: Color,
    state: LoopState,
}

impl FrameLoop {
    pub fn new(camera: Camera, scene: Scene, projector: Projector, background: Color) -> Self {
        Self {
            camera,
            scene,
            projector,
            background,
            state: LoopState::Running,
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Runs one iteration: input, camera update, clear, draw, present.
    ///
    /// A quit stops draining, so events queued behind it are dropped, and the
    /// cleared frame is never presented.
    pub fn step<C: Canvas>(
        &mut self,
        events: impl IntoIterator<Item = InputEvent>,
        canvas: &mut C,
    ) -> Result<Frame, C::Error> {
        if self.state == LoopState::Stopped {
            return Ok(self.frame(0, 0));
        }

        for event in events {
            match event {
                InputEvent::Close | InputEvent::Pressed(Control::Quit) => {
                    self.state = LoopState::Stopped;
                    break;
                }
                InputEvent::Pressed(control) => control.apply(&mut self.camera, 1.0),
                InputEvent::Released(control) => control.apply(&mut self.camera, -1.0),
            }
        }

        self.camera.update();
        canvas.clear(self.background);

        if self.state == LoopState::Stopped {
            log::debug!("quit requested at {:?}", self.camera.pos);
            return Ok(self.frame(0, 0));
        }

        let (mut drawn, mut culled) = (0, 0);
        for point in self.scene.iter() {
            match self.projector.project(point, &self.camera).pixel() {
                Some(circle) => {
                    canvas.fill_circle(circle.x, circle.y, circle.radius, point.color);
                    drawn += 1
                }
                None => culled += 1,
            }
        }
        canvas.present()?;

        log::trace!("frame drawn={} culled={}", drawn, culled);
        Ok(self.frame(drawn, culled))
    }

    fn frame(&self, drawn: usize, culled: usize) -> Frame {
        Frame {
            state: self.state,
            drawn,
            culled,
        }
    }
}

/// Fixed-rate frame deadlines.
#[derive(Debug, Copy, Clone)]
pub struct FramePacer {
    period: Duration,
    deadline: Instant,
}

impl FramePacer {
    pub fn new(frame_rate: u32, now: Instant) -> Self {
        Self {
            period: Duration::from_secs(1) / frame_rate.max(1),
            deadline: now,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.deadline
    }

    /// Marks a frame as started at `now` and returns the next deadline. A loop
    /// more than one period late re-anchors instead of catching up.
    pub fn tick(&mut self, now: Instant) -> Instant {
        let next = self.deadline + self.period;
        self.deadline = if next <= now {
            now + self.period
        } else {
            next
        };
        self.deadline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::MOVE_SPEED;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Clear(Color),
        Circle(i32, i32, i32, Color),
        Present,
    }

    #[derive(Default)]
    struct RecordingCanvas {
        calls: Vec<Call>,
    }

    impl RecordingCanvas {
        fn circles(&self) -> Vec<&Call> {
            self.calls
                .iter()
                .filter(|call| matches!(call, Call::Circle(..)))
                .collect()
        }
    }

    impl Canvas for RecordingCanvas {
        type Error = std::convert::Infallible;

        fn clear(&mut self, color: Color) {
            self.calls.push(Call::Clear(color))
        }

        fn fill_circle(&mut self, x: i32, y: i32, radius: i32, color: Color) {
            self.calls.push(Call::Circle(x, y, radius, color))
        }

        fn present(&mut self) -> Result<(), Self::Error> {
            self.calls.push(Call::Present);
            Ok(())
        }
    }

    const BACKGROUND: Color = Color::rgb(20, 5, 35);

    fn frame_loop() -> FrameLoop {
        FrameLoop::new(
            Camera::default(),
            Scene::two_squares(),
            Projector::default(),
            BACKGROUND,
        )
    }

    #[test]
    fn draws_every_point_in_order() {
        let mut frame_loop = frame_loop();
        let mut canvas = RecordingCanvas::default();
        let frame = frame_loop.step(Vec::new(), &mut canvas).unwrap();

        assert_eq!(
            frame,
            Frame {
                state: LoopState::Running,
                drawn: 8,
                culled: 0
            }
        );
        assert_eq!(canvas.calls.len(), 10);
        assert_eq!(canvas.calls[0], Call::Clear(BACKGROUND));
        assert_eq!(canvas.calls[1], Call::Circle(480, 220, 6, Color::RED));
        assert_eq!(canvas.calls[2], Call::Circle(457, 242, 4, Color::BLUE));
        assert_eq!(canvas.calls[9], Call::Present);
    }

    #[test]
    fn quit_key_stops_without_presenting() {
        let mut frame_loop = frame_loop();
        let mut canvas = RecordingCanvas::default();
        let events = vec![
            InputEvent::Pressed(Control::Quit),
            InputEvent::Pressed(Control::Forward),
        ];
        let frame = frame_loop.step(events, &mut canvas).unwrap();

        assert_eq!(frame.state, LoopState::Stopped);
        assert_eq!(canvas.calls, vec![Call::Clear(BACKGROUND)]);
        // the forward press queued behind the quit is dropped
        assert_eq!(frame_loop.camera().velocity, uv::Vec3::zero());
    }

    #[test]
    fn close_is_terminal() {
        let mut frame_loop = frame_loop();
        let mut canvas = RecordingCanvas::default();
        frame_loop
            .step(vec![InputEvent::Close], &mut canvas)
            .unwrap();
        canvas.calls.clear();

        let frame = frame_loop.step(Vec::new(), &mut canvas).unwrap();
        assert_eq!(frame.state, LoopState::Stopped);
        assert!(canvas.calls.is_empty());
        assert_eq!(frame_loop.state(), LoopState::Stopped);
    }

    #[test]
    fn events_drive_the_camera_before_drawing() {
        let mut frame_loop = frame_loop();
        let mut canvas = RecordingCanvas::default();
        frame_loop
            .step(vec![InputEvent::Pressed(Control::Forward)], &mut canvas)
            .unwrap();
        assert_eq!(frame_loop.camera().pos.z, MOVE_SPEED);

        frame_loop
            .step(vec![InputEvent::Released(Control::Forward)], &mut canvas)
            .unwrap();
        assert_eq!(frame_loop.camera().velocity, uv::Vec3::zero());
        assert_eq!(frame_loop.camera().pos.z, MOVE_SPEED);
    }

    #[test]
    fn opposite_controls_cancel() {
        let mut frame_loop = frame_loop();
        let mut canvas = RecordingCanvas::default();
        let events = vec![
            InputEvent::Pressed(Control::StrafeLeft),
            InputEvent::Pressed(Control::StrafeRight),
            InputEvent::Pressed(Control::TurnLeft),
            InputEvent::Pressed(Control::TurnRight),
            InputEvent::Pressed(Control::Backward),
        ];
        frame_loop.step(events, &mut canvas).unwrap();
        let camera = frame_loop.camera();
        assert_eq!(camera.velocity, uv::Vec3::new(0.0, 0.0, -MOVE_SPEED));
        assert_eq!(camera.angular_velocity, 0.0);
        assert_eq!(camera.yaw(), 0.0);
    }

    #[test]
    fn points_behind_the_camera_are_skipped() {
        let mut frame_loop = FrameLoop::new(
            Camera::new(uv::Vec3::new(0.0, 0.0, 1.2), 0.0),
            Scene::two_squares(),
            Projector::default(),
            BACKGROUND,
        );
        let mut canvas = RecordingCanvas::default();
        let frame = frame_loop.step(Vec::new(), &mut canvas).unwrap();
        assert_eq!((frame.drawn, frame.culled), (4, 4));
        assert_eq!(canvas.circles().len(), 4);
        assert_eq!(canvas.calls.last(), Some(&Call::Present));
    }

    #[test]
    fn pacer_advances_by_period() {
        let start = Instant::now();
        let mut pacer = FramePacer::new(60, start);
        assert!(pacer.is_due(start));
        let first = pacer.tick(start);
        assert_eq!(first, start + pacer.period());
        assert!(!pacer.is_due(start + pacer.period() / 2));

        let second = pacer.tick(first + Duration::from_millis(1));
        assert_eq!(second, start + pacer.period() * 2);
    }

    #[test]
    fn pacer_reanchors_when_late() {
        let start = Instant::now();
        let mut pacer = FramePacer::new(60, start);
        pacer.tick(start);
        let late = start + Duration::from_secs(1);
        assert_eq!(pacer.tick(late), late + pacer.period());
    }

    #[test]
    fn pacer_period_from_rate() {
        let pacer = FramePacer::new(50, Instant::now());
        assert_eq!(pacer.period(), Duration::from_millis(20));
    }
}
