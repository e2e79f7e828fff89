//! The devtools "copy element" sequence
//!
//! With the page rendered and focused, this opens developer tools, walks the
//! elements panel context menu down to the copy entry and reads back what
//! landed on the clipboard. There is no readiness signal for any of it; each
//! UI step is followed by a fixed settle delay.

use crate::browser::desktop::{devtools_chord, Desktop, MenuKey};
use crate::config::AutomationConfig;
use crate::error::{ExtractionError, Result};
use tracing::{debug, info, instrument};

const PREVIEW_CHARS: usize = 40;

/// Run the sequence and return the copied markup
#[instrument(skip_all)]
pub async fn copy_rendered_html(
    desktop: &mut dyn Desktop,
    layout: &AutomationConfig,
) -> Result<String> {
    // A stale copy from the previous page must not pass for this one
    desktop.clear_clipboard()?;

    debug!("Opening developer tools");
    desktop.chord(devtools_chord(), 'i')?;
    tokio::time::sleep(layout.settle()).await;

    debug!(
        "Walking context menu: {} down, right, {} down, return",
        layout.menu_steps, layout.submenu_steps
    );
    desktop.context_click(layout.context_click)?;
    desktop.tap(MenuKey::Down, layout.menu_steps)?;
    desktop.tap(MenuKey::Right, 1)?;
    desktop.tap(MenuKey::Down, layout.submenu_steps)?;
    desktop.tap(MenuKey::Return, 1)?;
    tokio::time::sleep(layout.settle()).await;

    let text = desktop.clipboard_text()?;
    check_markup(&text)?;
    info!("Copied {} bytes of rendered HTML", text.len());
    Ok(text)
}

/// Reject clipboard text that cannot be the copied element
pub fn check_markup(text: &str) -> Result<()> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ExtractionError::EmptyClipboard.into());
    }
    if !trimmed.starts_with('<') || !trimmed.contains('>') {
        let preview: String = trimmed.chars().take(PREVIEW_CHARS).collect();
        return Err(ExtractionError::NotHtml { preview }.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::desktop::Modifier;
    use crate::config::ScreenPoint;
    use crate::error::Error;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Event {
        Chord(Vec<Modifier>, char),
        Click(i32, i32),
        Tap(MenuKey, u32),
        Clear,
        Read,
    }

    struct ScriptedDesktop {
        events: Vec<Event>,
        clipboard: String,
        copy_on_return: Option<String>,
    }

    impl ScriptedDesktop {
        fn copying(html: &str) -> Self {
            Self {
                events: Vec::new(),
                clipboard: "stale text from last page".to_string(),
                copy_on_return: Some(html.to_string()),
            }
        }
    }

    impl Desktop for ScriptedDesktop {
        fn chord(&mut self, modifiers: &[Modifier], key: char) -> Result<()> {
            self.events.push(Event::Chord(modifiers.to_vec(), key));
            Ok(())
        }

        fn context_click(&mut self, at: ScreenPoint) -> Result<()> {
            self.events.push(Event::Click(at.x, at.y));
            Ok(())
        }

        fn tap(&mut self, key: MenuKey, times: u32) -> Result<()> {
            self.events.push(Event::Tap(key, times));
            if key == MenuKey::Return {
                if let Some(html) = self.copy_on_return.take() {
                    self.clipboard = html;
                }
            }
            Ok(())
        }

        fn clear_clipboard(&mut self) -> Result<()> {
            self.events.push(Event::Clear);
            self.clipboard.clear();
            Ok(())
        }

        fn clipboard_text(&mut self) -> Result<String> {
            self.events.push(Event::Read);
            Ok(self.clipboard.clone())
        }
    }

    fn layout() -> AutomationConfig {
        AutomationConfig {
            context_click: ScreenPoint { x: 900, y: 300 },
            settle_ms: 0,
            ..AutomationConfig::default()
        }
    }

    #[tokio::test]
    async fn test_sequence_order() {
        let mut desktop = ScriptedDesktop::copying("<div id=\"root\">hi</div>");
        let html = copy_rendered_html(&mut desktop, &layout()).await.unwrap();
        assert_eq!(html, "<div id=\"root\">hi</div>");

        assert_eq!(
            desktop.events,
            vec![
                Event::Clear,
                Event::Chord(devtools_chord().to_vec(), 'i'),
                Event::Click(900, 300),
                Event::Tap(MenuKey::Down, 6),
                Event::Tap(MenuKey::Right, 1),
                Event::Tap(MenuKey::Down, 1),
                Event::Tap(MenuKey::Return, 1),
                Event::Read,
            ]
        );
    }

    #[tokio::test]
    async fn test_stale_clipboard_reads_as_empty() {
        let mut desktop = ScriptedDesktop::copying("<p>x</p>");
        desktop.copy_on_return = None;
        let err = copy_rendered_html(&mut desktop, &layout()).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Extraction(ExtractionError::EmptyClipboard)
        ));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_wrong_menu_entry_is_not_html() {
        let mut desktop = ScriptedDesktop::copying("https://example.com/pages/abc/");
        let err = copy_rendered_html(&mut desktop, &layout()).await.unwrap_err();
        match err {
            Error::Extraction(ExtractionError::NotHtml { preview }) => {
                assert_eq!(preview, "https://example.com/pages/abc/")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_check_markup() {
        assert!(check_markup("  <html><body></body></html>\n").is_ok());
        assert!(check_markup("").is_err());
        assert!(check_markup("plain words").is_err());
        assert!(check_markup("<unterminated").is_err());
    }
}
