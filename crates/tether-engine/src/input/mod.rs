//! Input forwarding.
//!
//! Public API is platform-agnostic and does not expose winit types. The host
//! runtime translates platform events into `InputEvent`s and hands them to the
//! `EventListener` installed on the surface owner, on the owner thread.

mod listener;
pub mod platform;
mod types;

pub use listener::{EventListener, dispatch};
pub use types::{
    InputEvent, Key, KeyEvent, KeyState, Modifiers, PointerButton, PointerEvent, PointerPhase,
};
