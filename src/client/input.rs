use crate::frame::{Control, InputEvent};
use winit::event::{ElementState, VirtualKeyCode};

pub fn binding(keycode: VirtualKeyCode) -> Option<Control> {
    match keycode {
        VirtualKeyCode::W => Some(Control::Forward),
        VirtualKeyCode::S => Some(Control::Backward),
        VirtualKeyCode::A => Some(Control::StrafeLeft),
        VirtualKeyCode::D => Some(Control::StrafeRight),
        VirtualKeyCode::Left => Some(Control::TurnLeft),
        VirtualKeyCode::Right => Some(Control::TurnRight),
        VirtualKeyCode::Q => Some(Control::Quit),
        _ => None,
    }
}

/// Turns raw keyboard input into down/up transitions. Auto-repeat presses and
/// releases of keys never seen pressed are dropped, so every `Released`
/// follows exactly one `Pressed`.
pub struct KeyState {
    key_held: [bool; 255],
}

impl KeyState {
    pub fn new() -> Self {
        Self {
            key_held: [false; 255],
        }
    }

    #[cfg(test)]
    pub fn key_held(&self, keycode: VirtualKeyCode) -> bool {
        self.key_held[keycode as usize]
    }

    pub fn transition(
        &mut self,
        keycode: VirtualKeyCode,
        state: ElementState,
    ) -> Option<InputEvent> {
        let pressed = state == ElementState::Pressed;
        let held = &mut self.key_held[keycode as usize];
        if *held == pressed {
            return None;
        }
        *held = pressed;
        let control = binding(keycode)?;
        Some(if pressed {
            InputEvent::Pressed(control)
        } else {
            InputEvent::Released(control)
        })
    }

    /// Releases every held key, for when the window loses focus and the
    /// matching key-up events would never arrive.
    pub fn release_all(&mut self) -> Vec<InputEvent> {
        const KEYS: [VirtualKeyCode; 7] = [
            VirtualKeyCode::W,
            VirtualKeyCode::S,
            VirtualKeyCode::A,
            VirtualKeyCode::D,
            VirtualKeyCode::Left,
            VirtualKeyCode::Right,
            VirtualKeyCode::Q,
        ];
        let events = KEYS
            .iter()
            .filter_map(|&keycode| self.transition(keycode, ElementState::Released))
            .collect();
        self.key_held = [false; 255];
        events
    }
}
