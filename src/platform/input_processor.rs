//=========================================================================
// Input Processor
//=========================================================================
//
// Converts platform-specific Winit events into engine platform events.
//
// Architecture:
//   Winit Events → InputProcessor → PlatformEvent → channel → scheduler
//
// Stateful cursor tracking: mouse motion only updates the cached
// position; button events attach the cached position, so clicks carry
// coordinates the way scripts expect. Unmapped keys are not filtered,
// they surface under the catch-all "unknown" name.
//
//=========================================================================

//=== External Dependencies ===============================================

use winit::{
    event::ElementState,
    event::{KeyEvent, MouseButton as WinitMouseButton},
    keyboard::{KeyCode as WinitKeyCode, PhysicalKey},
};

//=== Internal Dependencies ===============================================

use crate::core::events::{KeySym, MouseButton};
use crate::core::platform_bridge::PlatformEvent;

//=== InputProcessor ======================================================

/// Converts Winit events to platform events with stateful cursor
/// tracking.
pub(crate) struct InputProcessor {
    cursor: (i32, i32),
}

impl InputProcessor {
    //--- Construction -----------------------------------------------------

    pub(crate) fn new() -> Self {
        Self { cursor: (0, 0) }
    }

    //--- Cursor State Management ------------------------------------------

    /// Caches the cursor position (attached to subsequent clicks).
    pub(crate) fn track_cursor(&mut self, x: f64, y: f64) {
        self.cursor = (x as i32, y as i32);
    }

    //--- Event Processing -------------------------------------------------

    /// Converts a Winit KeyEvent. OS auto-repeats are dropped so only
    /// real transitions reach the aggregator.
    pub(crate) fn process_key_event(&self, key_event: &KeyEvent) -> Option<PlatformEvent> {
        if key_event.repeat {
            return None;
        }

        let sym = match key_event.physical_key {
            PhysicalKey::Code(code) => KeySym::from(code),
            _ => KeySym::Unknown,
        };

        Some(self.key_transition(sym, key_event.state))
    }

    /// Converts a Winit mouse button event, stamping the cached cursor
    /// position.
    pub(crate) fn process_mouse_button(
        &self,
        button: WinitMouseButton,
        state: ElementState,
    ) -> PlatformEvent {
        PlatformEvent::Mouse {
            down: matches!(state, ElementState::Pressed),
            button: MouseButton::from(button),
            x: self.cursor.0,
            y: self.cursor.1,
        }
    }

    //--- Internal Helpers -------------------------------------------------

    fn key_transition(&self, sym: KeySym, state: ElementState) -> PlatformEvent {
        PlatformEvent::Key {
            sym,
            pressed: matches!(state, ElementState::Pressed),
        }
    }

    //--- Test Accessors ---------------------------------------------------

    #[cfg(test)]
    pub(crate) fn cursor(&self) -> (i32, i32) {
        self.cursor
    }
}

//=========================================================================
// Winit Conversions
//=========================================================================

/// Converts Winit physical key codes to script key symbols.
///
/// Maps A-Z, arrows, space and escape. Everything else collapses to
/// `Unknown`, which scripts still see under the "unknown" name.
impl From<WinitKeyCode> for KeySym {
    fn from(code: WinitKeyCode) -> Self {
        use WinitKeyCode::*;
        match code {
            //--- Arrows -------------------------------------------------------

            ArrowLeft => KeySym::Left,
            ArrowRight => KeySym::Right,
            ArrowUp => KeySym::Up,
            ArrowDown => KeySym::Down,

            //--- Special ------------------------------------------------------

            Space => KeySym::Space,
            Escape => KeySym::Escape,

            //--- Letters ------------------------------------------------------

            KeyA => KeySym::A,
            KeyB => KeySym::B,
            KeyC => KeySym::C,
            KeyD => KeySym::D,
            KeyE => KeySym::E,
            KeyF => KeySym::F,
            KeyG => KeySym::G,
            KeyH => KeySym::H,
            KeyI => KeySym::I,
            KeyJ => KeySym::J,
            KeyK => KeySym::K,
            KeyL => KeySym::L,
            KeyM => KeySym::M,
            KeyN => KeySym::N,
            KeyO => KeySym::O,
            KeyP => KeySym::P,
            KeyQ => KeySym::Q,
            KeyR => KeySym::R,
            KeyS => KeySym::S,
            KeyT => KeySym::T,
            KeyU => KeySym::U,
            KeyV => KeySym::V,
            KeyW => KeySym::W,
            KeyX => KeySym::X,
            KeyY => KeySym::Y,
            KeyZ => KeySym::Z,

            //--- Unmapped (collapse to Unknown) -------------------------------

            _ => KeySym::Unknown,
        }
    }
}

/// Converts Winit mouse buttons to script button indices.
///
/// Left/Middle/Right mapped directly; Back/Forward → Other.
impl From<WinitMouseButton> for MouseButton {
    fn from(button: WinitMouseButton) -> Self {
        match button {
            WinitMouseButton::Left => MouseButton::Left,
            WinitMouseButton::Middle => MouseButton::Middle,
            WinitMouseButton::Right => MouseButton::Right,
            _ => MouseButton::Other,
        }
    }
}

//=========================================================================
// Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_the_origin() {
        let processor = InputProcessor::new();
        assert_eq!(processor.cursor(), (0, 0));
    }

    #[test]
    fn clicks_carry_the_cached_cursor_position() {
        let mut processor = InputProcessor::new();
        processor.track_cursor(123.7, 456.2);

        let event = processor.process_mouse_button(WinitMouseButton::Left, ElementState::Pressed);

        assert_eq!(
            event,
            PlatformEvent::Mouse {
                down: true,
                button: MouseButton::Left,
                x: 123,
                y: 456,
            }
        );
    }

    #[test]
    fn release_clears_the_down_flag() {
        let processor = InputProcessor::new();

        let event = processor.process_mouse_button(WinitMouseButton::Right, ElementState::Released);

        match event {
            PlatformEvent::Mouse { down, button, .. } => {
                assert!(!down);
                assert_eq!(button, MouseButton::Right);
            }
            other => panic!("expected a mouse event, got {:?}", other),
        }
    }

    #[test]
    fn key_transition_tracks_press_state() {
        let processor = InputProcessor::new();

        let down = processor.key_transition(KeySym::Space, ElementState::Pressed);
        let up = processor.key_transition(KeySym::Space, ElementState::Released);

        assert_eq!(
            down,
            PlatformEvent::Key {
                sym: KeySym::Space,
                pressed: true
            }
        );
        assert_eq!(
            up,
            PlatformEvent::Key {
                sym: KeySym::Space,
                pressed: false
            }
        );
    }

    #[test]
    fn keycode_conversion_alphabetic() {
        assert_eq!(KeySym::from(WinitKeyCode::KeyA), KeySym::A);
        assert_eq!(KeySym::from(WinitKeyCode::KeyZ), KeySym::Z);
    }

    #[test]
    fn keycode_conversion_arrows_and_special() {
        assert_eq!(KeySym::from(WinitKeyCode::ArrowLeft), KeySym::Left);
        assert_eq!(KeySym::from(WinitKeyCode::ArrowDown), KeySym::Down);
        assert_eq!(KeySym::from(WinitKeyCode::Space), KeySym::Space);
        assert_eq!(KeySym::from(WinitKeyCode::Escape), KeySym::Escape);
    }

    #[test]
    fn unmapped_keys_collapse_to_unknown() {
        assert_eq!(KeySym::from(WinitKeyCode::F13), KeySym::Unknown);
        assert_eq!(KeySym::from(WinitKeyCode::Numpad4), KeySym::Unknown);
        assert_eq!(KeySym::from(WinitKeyCode::Tab), KeySym::Unknown);
    }

    #[test]
    fn mouse_button_conversion() {
        assert_eq!(MouseButton::from(WinitMouseButton::Left), MouseButton::Left);
        assert_eq!(
            MouseButton::from(WinitMouseButton::Middle),
            MouseButton::Middle
        );
        assert_eq!(
            MouseButton::from(WinitMouseButton::Right),
            MouseButton::Right
        );
        assert_eq!(
            MouseButton::from(WinitMouseButton::Back),
            MouseButton::Other
        );
    }
}
