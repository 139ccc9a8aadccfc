use std::fmt;

/// Keyboard key identifier.
///
/// Only keys hosts commonly react to are named. Everything else keeps the
/// platform code in `Key::Unknown`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Key {
    Escape,
    Enter,
    Space,
    Tab,
    Backspace,

    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,

    /// Platform "go back" key. Never forwarded to listeners; the host keeps
    /// its default navigation behavior.
    Back,

    /// Printable character key, lowercase.
    Char(char),

    Unknown(u32),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Char(c) => write!(f, "'{c}'"),
            Key::Unknown(code) => write!(f, "Unknown({code:#x})"),
            other => write!(f, "{other:?}"),
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum KeyState {
    Pressed,
    Released,
}

/// Modifier keys held during an event.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub fn any(&self) -> bool {
        self.shift || self.ctrl || self.alt || self.meta
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct KeyEvent {
    pub key: Key,
    pub state: KeyState,
    pub modifiers: Modifiers,
    /// True for auto-repeat presses.
    pub repeat: bool,
}

impl KeyEvent {
    pub fn pressed(key: Key) -> Self {
        Self {
            key,
            state: KeyState::Pressed,
            modifiers: Modifiers::default(),
            repeat: false,
        }
    }

    pub fn is_pressed(&self) -> bool {
        self.state == KeyState::Pressed
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
    Other(u16),
}

/// Stage of a pointer (mouse or touch) interaction.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PointerPhase {
    Down(PointerButton),
    Moved,
    Up(PointerButton),
    /// The pointer left the surface.
    Cancelled,
}

/// Pointer event in physical surface pixels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PointerEvent {
    pub phase: PointerPhase,
    pub x: f32,
    pub y: f32,
    pub modifiers: Modifiers,
}

/// Input delivered to the owner's event listener.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum InputEvent {
    Key(KeyEvent),
    Pointer(PointerEvent),
}
