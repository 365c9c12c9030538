//=========================================================================
// Key Symbols
//=========================================================================
//
// Script-facing identifiers for keyboard and mouse input.
//
// The symbol set is fixed: arrows, space, escape and the letter keys.
// Anything else the platform reports collapses into the `Unknown`
// sentinel so recording an event can never fail.
//
//=========================================================================

//=== KeySym ==============================================================

/// Physical key identifier as seen by script code.
///
/// `name()` yields the lowercase string key used in the event snapshot
/// tables (`eventList.keyDown.key["a"]` and friends).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KeySym {
    //--- Arrow Keys -------------------------------------------------------

    Left,
    Right,
    Up,
    Down,

    //--- Special Keys -----------------------------------------------------

    Space,
    Escape,

    //--- Letter Keys ------------------------------------------------------

    A, B, C, D, E, F, G, H, I,
    J, K, L, M, N, O, P, Q, R,
    S, T, U, V, W, X, Y, Z,

    /// Fallback for keys outside the mapped set.
    Unknown,
}

impl KeySym {
    /// The string under which this key appears in the script snapshot.
    pub fn name(self) -> &'static str {
        match self {
            KeySym::Left => "left",
            KeySym::Right => "right",
            KeySym::Up => "up",
            KeySym::Down => "down",
            KeySym::Space => "space",
            KeySym::Escape => "escape",
            KeySym::A => "a",
            KeySym::B => "b",
            KeySym::C => "c",
            KeySym::D => "d",
            KeySym::E => "e",
            KeySym::F => "f",
            KeySym::G => "g",
            KeySym::H => "h",
            KeySym::I => "i",
            KeySym::J => "j",
            KeySym::K => "k",
            KeySym::L => "l",
            KeySym::M => "m",
            KeySym::N => "n",
            KeySym::O => "o",
            KeySym::P => "p",
            KeySym::Q => "q",
            KeySym::R => "r",
            KeySym::S => "s",
            KeySym::T => "t",
            KeySym::U => "u",
            KeySym::V => "v",
            KeySym::W => "w",
            KeySym::X => "x",
            KeySym::Y => "y",
            KeySym::Z => "z",
            KeySym::Unknown => "unknown",
        }
    }
}

//=== MouseButton =========================================================

/// Physical mouse button identifier.
///
/// `script_index()` yields the numeric index script code sees
/// (`eventList.mouse[1]` is the left button).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MouseButton {
    Left,
    Middle,
    Right,

    /// Side buttons, thumb buttons and anything else non-standard.
    Other,
}

impl MouseButton {
    /// Numeric button index used in the script snapshot.
    pub fn script_index(self) -> u8 {
        match self {
            MouseButton::Left => 1,
            MouseButton::Middle => 2,
            MouseButton::Right => 3,
            MouseButton::Other => 4,
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
