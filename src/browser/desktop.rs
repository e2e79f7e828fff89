//! OS-level input and clipboard capability
//!
//! The devtools copy sequence needs real keyboard/mouse events and the system
//! clipboard, both of which belong to the whole desktop session rather than
//! to the browser. [`Desktop`] is the seam; [`native_desktop`] returns the
//! enigo + arboard backend when the `desktop` feature is enabled.

use crate::config::ScreenPoint;
use crate::error::Result;

/// Modifier keys used in chords
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    /// Ctrl
    Control,
    /// Shift
    Shift,
    /// Alt / Option
    Alt,
    /// Command / Super / Windows
    Meta,
}

/// Keys used to walk a context menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuKey {
    /// Down arrow
    Down,
    /// Right arrow (opens a submenu)
    Right,
    /// Return (activates the entry)
    Return,
}

/// Simulated human input plus clipboard access.
///
/// Implementations own global resources; only one may be driven at a time.
pub trait Desktop {
    /// Hold `modifiers`, click `key`, release the modifiers
    fn chord(&mut self, modifiers: &[Modifier], key: char) -> Result<()>;

    /// Move the pointer to `at` and right-click
    fn context_click(&mut self, at: ScreenPoint) -> Result<()>;

    /// Press `key` `times` times
    fn tap(&mut self, key: MenuKey, times: u32) -> Result<()>;

    /// Empty the clipboard
    fn clear_clipboard(&mut self) -> Result<()>;

    /// Clipboard text; empty when the clipboard holds no text
    fn clipboard_text(&mut self) -> Result<String>;
}

/// Chord that opens the browser's developer tools on this OS
pub fn devtools_chord() -> &'static [Modifier] {
    if cfg!(target_os = "macos") {
        &[Modifier::Meta, Modifier::Alt]
    } else {
        &[Modifier::Control, Modifier::Shift]
    }
}

/// The desktop backend compiled into this build
#[cfg(feature = "desktop")]
pub fn native_desktop() -> Result<Box<dyn Desktop>> {
    Ok(Box::new(native::EnigoDesktop::new()?))
}

/// The desktop backend compiled into this build
#[cfg(not(feature = "desktop"))]
pub fn native_desktop() -> Result<Box<dyn Desktop>> {
    Err(crate::error::Error::config(
        "built without desktop input support; rebuild with `--features desktop`",
    ))
}

#[cfg(feature = "desktop")]
mod native {
    use super::{Desktop, MenuKey, Modifier};
    use crate::config::ScreenPoint;
    use crate::error::{ExtractionError, Result};
    use enigo::{Button, Coordinate, Direction, Enigo, Key, Keyboard, Mouse, Settings};
    use tracing::debug;

    /// enigo for input, arboard for the clipboard
    pub struct EnigoDesktop {
        enigo: Enigo,
        clipboard: arboard::Clipboard,
    }

    impl EnigoDesktop {
        pub fn new() -> Result<Self> {
            let enigo = Enigo::new(&Settings::default())
                .map_err(|e| ExtractionError::Input(e.to_string()))?;
            let clipboard =
                arboard::Clipboard::new().map_err(|e| ExtractionError::Clipboard(e.to_string()))?;
            Ok(Self { enigo, clipboard })
        }

        fn key(&mut self, key: Key, direction: Direction) -> Result<()> {
            self.enigo
                .key(key, direction)
                .map_err(|e| ExtractionError::Input(e.to_string()).into())
        }
    }

    fn modifier_key(modifier: Modifier) -> Key {
        match modifier {
            Modifier::Control => Key::Control,
            Modifier::Shift => Key::Shift,
            Modifier::Alt => Key::Alt,
            Modifier::Meta => Key::Meta,
        }
    }

    impl Desktop for EnigoDesktop {
        fn chord(&mut self, modifiers: &[Modifier], key: char) -> Result<()> {
            debug!("Chord {:?}+{}", modifiers, key);
            let mut held = Vec::with_capacity(modifiers.len());
            let mut result = Ok(());
            for modifier in modifiers {
                result = self.key(modifier_key(*modifier), Direction::Press);
                if result.is_err() {
                    break;
                }
                held.push(*modifier);
            }
            if result.is_ok() {
                result = self.key(Key::Unicode(key), Direction::Click);
            }
            // Never leave a modifier stuck down
            for modifier in held.into_iter().rev() {
                let released = self.key(modifier_key(modifier), Direction::Release);
                if result.is_ok() {
                    result = released;
                }
            }
            result
        }

        fn context_click(&mut self, at: ScreenPoint) -> Result<()> {
            debug!("Right-click at ({}, {})", at.x, at.y);
            self.enigo
                .move_mouse(at.x, at.y, Coordinate::Abs)
                .and_then(|_| self.enigo.button(Button::Right, Direction::Click))
                .map_err(|e| ExtractionError::Input(e.to_string()).into())
        }

        fn tap(&mut self, key: MenuKey, times: u32) -> Result<()> {
            let key = match key {
                MenuKey::Down => Key::DownArrow,
                MenuKey::Right => Key::RightArrow,
                MenuKey::Return => Key::Return,
            };
            for _ in 0..times {
                self.key(key, Direction::Click)?;
            }
            Ok(())
        }

        fn clear_clipboard(&mut self) -> Result<()> {
            self.clipboard
                .clear()
                .map_err(|e| ExtractionError::Clipboard(e.to_string()).into())
        }

        fn clipboard_text(&mut self) -> Result<String> {
            match self.clipboard.get_text() {
                Ok(text) => Ok(text),
                Err(arboard::Error::ContentNotAvailable) => Ok(String::new()),
                Err(e) => Err(ExtractionError::Clipboard(e.to_string()).into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_devtools_chord_per_platform() {
        let chord = devtools_chord();
        if cfg!(target_os = "macos") {
            assert_eq!(chord, &[Modifier::Meta, Modifier::Alt]);
        } else {
            assert_eq!(chord, &[Modifier::Control, Modifier::Shift]);
        }
    }

    #[cfg(not(feature = "desktop"))]
    #[test]
    fn test_native_desktop_missing_is_fatal() {
        let err = native_desktop().err().unwrap();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("--features desktop"));
    }
}
