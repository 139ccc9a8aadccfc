use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::keyboard::{KeyCode, ModifiersState, PhysicalKey};

use crate::input::{
    InputEvent, Key, KeyEvent, KeyState, Modifiers, PointerButton, PointerEvent, PointerPhase,
};

/// Translates winit window events into engine `InputEvent`s.
///
/// winit 0.30 reports modifiers and cursor position as separate events, so the
/// translator tracks both and stamps them onto key and button events.
#[derive(Debug, Default)]
pub struct WinitTranslator {
    modifiers: Modifiers,
    pointer: Option<(f32, f32)>,
}

impl WinitTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last known pointer position in physical pixels.
    pub fn pointer(&self) -> Option<(f32, f32)> {
        self.pointer
    }

    /// Returns `None` for events the input subsystem does not represent.
    pub fn translate(&mut self, event: &WindowEvent) -> Option<InputEvent> {
        match event {
            WindowEvent::ModifiersChanged(m) => {
                self.modifiers = map_modifiers(m.state());
                None
            }

            WindowEvent::CursorMoved { position, .. } => {
                let (x, y) = (position.x as f32, position.y as f32);
                self.pointer = Some((x, y));
                Some(self.pointer_event(PointerPhase::Moved))
            }

            WindowEvent::CursorLeft { .. } => {
                let event = self.pointer_event(PointerPhase::Cancelled);
                self.pointer = None;
                Some(event)
            }

            WindowEvent::MouseInput { state, button, .. } => {
                let button = map_mouse_button(*button)?;
                let phase = match state {
                    ElementState::Pressed => PointerPhase::Down(button),
                    ElementState::Released => PointerPhase::Up(button),
                };
                Some(self.pointer_event(phase))
            }

            WindowEvent::KeyboardInput { event, .. } => Some(InputEvent::Key(KeyEvent {
                key: map_key(event.physical_key),
                state: match event.state {
                    ElementState::Pressed => KeyState::Pressed,
                    ElementState::Released => KeyState::Released,
                },
                modifiers: self.modifiers,
                repeat: event.repeat,
            })),

            _ => None,
        }
    }

    fn pointer_event(&self, phase: PointerPhase) -> InputEvent {
        let (x, y) = self.pointer.unwrap_or((0.0, 0.0));
        InputEvent::Pointer(PointerEvent {
            phase,
            x,
            y,
            modifiers: self.modifiers,
        })
    }
}

fn map_modifiers(m: ModifiersState) -> Modifiers {
    Modifiers {
        shift: m.shift_key(),
        ctrl: m.control_key(),
        alt: m.alt_key(),
        meta: m.super_key(),
    }
}

/// Mouse back/forward buttons are navigation, not pointer input.
fn map_mouse_button(b: MouseButton) -> Option<PointerButton> {
    match b {
        MouseButton::Left => Some(PointerButton::Primary),
        MouseButton::Right => Some(PointerButton::Secondary),
        MouseButton::Middle => Some(PointerButton::Middle),
        MouseButton::Back | MouseButton::Forward => None,
        MouseButton::Other(v) => Some(PointerButton::Other(v)),
    }
}

fn map_key(pk: PhysicalKey) -> Key {
    let code = match pk {
        PhysicalKey::Code(code) => code,
        PhysicalKey::Unidentified(_) => return Key::Unknown(0),
    };

    match code {
        KeyCode::Escape => Key::Escape,
        KeyCode::Enter | KeyCode::NumpadEnter => Key::Enter,
        KeyCode::Tab => Key::Tab,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Space => Key::Space,

        KeyCode::ArrowUp => Key::ArrowUp,
        KeyCode::ArrowDown => Key::ArrowDown,
        KeyCode::ArrowLeft => Key::ArrowLeft,
        KeyCode::ArrowRight => Key::ArrowRight,

        KeyCode::BrowserBack => Key::Back,

        KeyCode::KeyA => Key::Char('a'),
        KeyCode::KeyB => Key::Char('b'),
        KeyCode::KeyC => Key::Char('c'),
        KeyCode::KeyD => Key::Char('d'),
        KeyCode::KeyE => Key::Char('e'),
        KeyCode::KeyF => Key::Char('f'),
        KeyCode::KeyG => Key::Char('g'),
        KeyCode::KeyH => Key::Char('h'),
        KeyCode::KeyI => Key::Char('i'),
        KeyCode::KeyJ => Key::Char('j'),
        KeyCode::KeyK => Key::Char('k'),
        KeyCode::KeyL => Key::Char('l'),
        KeyCode::KeyM => Key::Char('m'),
        KeyCode::KeyN => Key::Char('n'),
        KeyCode::KeyO => Key::Char('o'),
        KeyCode::KeyP => Key::Char('p'),
        KeyCode::KeyQ => Key::Char('q'),
        KeyCode::KeyR => Key::Char('r'),
        KeyCode::KeyS => Key::Char('s'),
        KeyCode::KeyT => Key::Char('t'),
        KeyCode::KeyU => Key::Char('u'),
        KeyCode::KeyV => Key::Char('v'),
        KeyCode::KeyW => Key::Char('w'),
        KeyCode::KeyX => Key::Char('x'),
        KeyCode::KeyY => Key::Char('y'),
        KeyCode::KeyZ => Key::Char('z'),

        KeyCode::Digit0 => Key::Char('0'),
        KeyCode::Digit1 => Key::Char('1'),
        KeyCode::Digit2 => Key::Char('2'),
        KeyCode::Digit3 => Key::Char('3'),
        KeyCode::Digit4 => Key::Char('4'),
        KeyCode::Digit5 => Key::Char('5'),
        KeyCode::Digit6 => Key::Char('6'),
        KeyCode::Digit7 => Key::Char('7'),
        KeyCode::Digit8 => Key::Char('8'),
        KeyCode::Digit9 => Key::Char('9'),

        other => Key::Unknown(other as u32),
    }
}
