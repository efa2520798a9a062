//! Key chords: a key plus modifier set, parsed from strings like `ctrl+shift+a`.

use crate::domain::error::{Result, TodoError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A physical or named key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// A printable character, stored lowercase.
    Char(char),
    Enter,
    Esc,
    Tab,
    Backspace,
    Delete,
    Space,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    F(u8),
}

impl Key {
    fn parse(name: &str) -> Option<(Self, bool)> {
        let mut chars = name.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            let lower = c.to_lowercase().next().unwrap_or(c);
            return Some((Self::Char(lower), c.is_uppercase()));
        }

        let key = match name.to_ascii_lowercase().as_str() {
            "enter" | "return" => Self::Enter,
            "esc" | "escape" => Self::Esc,
            "tab" => Self::Tab,
            "backspace" => Self::Backspace,
            "delete" | "del" => Self::Delete,
            "space" => Self::Space,
            "up" => Self::Up,
            "down" => Self::Down,
            "left" => Self::Left,
            "right" => Self::Right,
            "home" => Self::Home,
            "end" => Self::End,
            "pageup" | "pgup" => Self::PageUp,
            "pagedown" | "pgdn" => Self::PageDown,
            other => {
                let n: u8 = other.strip_prefix('f')?.parse().ok()?;
                if (1..=24).contains(&n) {
                    Self::F(n)
                } else {
                    return None;
                }
            }
        };
        Some((key, false))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Char(c) => write!(f, "{c}"),
            Self::Enter => f.write_str("enter"),
            Self::Esc => f.write_str("esc"),
            Self::Tab => f.write_str("tab"),
            Self::Backspace => f.write_str("backspace"),
            Self::Delete => f.write_str("delete"),
            Self::Space => f.write_str("space"),
            Self::Up => f.write_str("up"),
            Self::Down => f.write_str("down"),
            Self::Left => f.write_str("left"),
            Self::Right => f.write_str("right"),
            Self::Home => f.write_str("home"),
            Self::End => f.write_str("end"),
            Self::PageUp => f.write_str("pageup"),
            Self::PageDown => f.write_str("pagedown"),
            Self::F(n) => write!(f, "f{n}"),
        }
    }
}

/// Held modifier keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self { ctrl: false, alt: false, shift: false, meta: false };
    pub const CTRL: Self = Self { ctrl: true, ..Self::NONE };
    pub const SHIFT: Self = Self { shift: true, ..Self::NONE };
}

/// A key pressed together with a modifier set.
///
/// # Examples
///
/// ```
/// use todo_core::shortcuts::{Key, KeyChord, Modifiers};
///
/// let chord: KeyChord = "Ctrl+Shift+A".parse()?;
/// assert_eq!(chord.key, Key::Char('a'));
/// assert_eq!(chord.modifiers, Modifiers { ctrl: true, shift: true, ..Modifiers::NONE });
/// assert_eq!(chord.to_string(), "ctrl+shift+a");
/// # Ok::<(), todo_core::domain::TodoError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyChord {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyChord {
    #[must_use]
    pub const fn new(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    #[must_use]
    pub const fn plain(key: Key) -> Self {
        Self::new(key, Modifiers::NONE)
    }

    #[must_use]
    pub const fn ctrl(c: char) -> Self {
        Self::new(Key::Char(c), Modifiers::CTRL)
    }
}

impl FromStr for KeyChord {
    type Err = TodoError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(TodoError::Shortcut("empty key chord".to_string()));
        }

        // A literal '+' key is written as "+" or "ctrl++".
        let (modifier_part, key_part) = if s == "+" {
            ("", "+")
        } else if let Some(prefix) = s.strip_suffix("++") {
            (prefix, "+")
        } else {
            s.rsplit_once('+').unwrap_or(("", s))
        };

        let mut modifiers = Modifiers::NONE;
        for name in modifier_part.split('+').filter(|part| !part.is_empty()) {
            match name.trim().to_ascii_lowercase().as_str() {
                "ctrl" | "control" => modifiers.ctrl = true,
                "alt" | "option" => modifiers.alt = true,
                "shift" => modifiers.shift = true,
                "meta" | "cmd" | "super" => modifiers.meta = true,
                other => return Err(TodoError::Shortcut(format!("unknown modifier '{other}' in '{s}'"))),
            }
        }

        let (key, implied_shift) = Key::parse(key_part.trim())
            .ok_or_else(|| TodoError::Shortcut(format!("unknown key '{key_part}' in '{s}'")))?;
        modifiers.shift |= implied_shift;

        Ok(Self { key, modifiers })
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Modifiers { ctrl, alt, shift, meta } = self.modifiers;
        for (held, name) in [(ctrl, "ctrl"), (alt, "alt"), (shift, "shift"), (meta, "meta")] {
            if held {
                write!(f, "{name}+")?;
            }
        }
        write!(f, "{}", self.key)
    }
}

impl Serialize for KeyChord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for KeyChord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_named_keys_and_modifiers() {
        assert_eq!("esc".parse::<KeyChord>().unwrap(), KeyChord::plain(Key::Esc));
        assert_eq!("/".parse::<KeyChord>().unwrap(), KeyChord::plain(Key::Char('/')));
        assert_eq!("ctrl+a".parse::<KeyChord>().unwrap(), KeyChord::ctrl('a'));
        assert_eq!("f5".parse::<KeyChord>().unwrap(), KeyChord::plain(Key::F(5)));
    }

    #[test]
    fn uppercase_implies_shift() {
        let chord: KeyChord = "A".parse().unwrap();
        assert_eq!(chord, KeyChord::new(Key::Char('a'), Modifiers::SHIFT));
    }

    #[test]
    fn plus_key_is_expressible() {
        let chord: KeyChord = "ctrl++".parse().unwrap();
        assert_eq!(chord, KeyChord::ctrl('+'));
        assert_eq!("+".parse::<KeyChord>().unwrap(), KeyChord::plain(Key::Char('+')));
    }

    #[test]
    fn rejects_unknown_parts() {
        assert!(matches!("hyper+a".parse::<KeyChord>(), Err(TodoError::Shortcut(_))));
        assert!(matches!("ctrl+nope".parse::<KeyChord>(), Err(TodoError::Shortcut(_))));
        assert!("".parse::<KeyChord>().is_err());
    }
}
