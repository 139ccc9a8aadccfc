use super::types::{InputEvent, Key, KeyEvent, PointerEvent};

/// Receives input on the owner thread.
///
/// Return `true` when the event was consumed. Listeners that need to touch
/// rendering state should hand the work to the render thread through the
/// owner's command queue.
pub trait EventListener: Send {
    fn on_key(&mut self, event: &KeyEvent) -> bool {
        let _ = event;
        false
    }

    fn on_pointer(&mut self, event: &PointerEvent) -> bool {
        let _ = event;
        false
    }
}

/// Routes `event` to the matching listener method.
///
/// `Key::Back` is never routed so the host keeps its navigation behavior.
pub fn dispatch(listener: &mut dyn EventListener, event: &InputEvent) -> bool {
    match event {
        InputEvent::Key(key) if key.key == Key::Back => false,
        InputEvent::Key(key) => listener.on_key(key),
        InputEvent::Pointer(pointer) => listener.on_pointer(pointer),
    }
}
