//! US-layout key definitions for synthesized keyboard input.

use crate::error::{CdpError, Result};
use zendriver_cdp::cdp::browser_protocol::input::{DispatchKeyEventParams, KeyEventType};

/// A resolved key: everything `Input.dispatchKeyEvent` wants to know.
#[derive(Debug, Clone)]
pub(crate) struct KeyInput {
    pub key: String,
    pub code: Option<String>,
    pub key_code: Option<i64>,
    /// The text the key generates, absent for non-printable keys.
    pub text: Option<String>,
}

struct KeyDefinition {
    key: &'static str,
    code: &'static str,
    key_code: i64,
    text: Option<&'static str>,
}

const NAMED_KEYS: &[KeyDefinition] = &[
    KeyDefinition { key: "Enter", code: "Enter", key_code: 13, text: Some("\r") },
    KeyDefinition { key: "Escape", code: "Escape", key_code: 27, text: None },
    KeyDefinition { key: "Backspace", code: "Backspace", key_code: 8, text: None },
    KeyDefinition { key: "Tab", code: "Tab", key_code: 9, text: None },
    KeyDefinition { key: "Delete", code: "Delete", key_code: 46, text: None },
    KeyDefinition { key: "ArrowLeft", code: "ArrowLeft", key_code: 37, text: None },
    KeyDefinition { key: "ArrowUp", code: "ArrowUp", key_code: 38, text: None },
    KeyDefinition { key: "ArrowRight", code: "ArrowRight", key_code: 39, text: None },
    KeyDefinition { key: "ArrowDown", code: "ArrowDown", key_code: 40, text: None },
    KeyDefinition { key: "Home", code: "Home", key_code: 36, text: None },
    KeyDefinition { key: "End", code: "End", key_code: 35, text: None },
    KeyDefinition { key: "PageUp", code: "PageUp", key_code: 33, text: None },
    KeyDefinition { key: "PageDown", code: "PageDown", key_code: 34, text: None },
    KeyDefinition { key: " ", code: "Space", key_code: 32, text: Some(" ") },
];

/// Resolve a key name like `"Escape"`, `"Enter"` or a single printable
/// character.
pub(crate) fn resolve(key: &str) -> Result<KeyInput> {
    if let Some(def) = NAMED_KEYS.iter().find(|def| def.key == key) {
        return Ok(KeyInput {
            key: def.key.to_string(),
            code: Some(def.code.to_string()),
            key_code: Some(def.key_code),
            text: def.text.map(str::to_string),
        });
    }

    let mut chars = key.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if !c.is_control() => Ok(for_char(c)),
        _ => Err(CdpError::msg(format!("unknown key: {key:?}"))),
    }
}

/// A printable character pressed as a key.
pub(crate) fn for_char(c: char) -> KeyInput {
    let key_code = c
        .is_ascii_alphanumeric()
        .then(|| c.to_ascii_uppercase() as i64);
    KeyInput {
        key: c.to_string(),
        code: None,
        key_code,
        text: Some(c.to_string()),
    }
}

impl KeyInput {
    /// The press and release events for this key, dispatched in order.
    pub fn events(&self) -> Vec<DispatchKeyEventParams> {
        let down_type = if self.text.is_some() {
            KeyEventType::KeyDown
        } else {
            KeyEventType::RawKeyDown
        };
        let mut down = DispatchKeyEventParams::new(down_type);
        down.key = Some(self.key.clone());
        down.code = self.code.clone();
        down.windows_virtual_key_code = self.key_code;
        down.native_virtual_key_code = self.key_code;
        down.text = self.text.clone();
        down.unmodified_text = self.text.clone();

        let mut up = DispatchKeyEventParams::new(KeyEventType::KeyUp);
        up.key = Some(self.key.clone());
        up.code = self.code.clone();
        up.windows_virtual_key_code = self.key_code;
        up.native_virtual_key_code = self.key_code;

        vec![down, up]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_key_resolves_with_key_code() {
        let key = resolve("Escape").unwrap();
        assert_eq!(key.key, "Escape");
        assert_eq!(key.key_code, Some(27));
        assert!(key.text.is_none());

        let events = key.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].r#type, KeyEventType::RawKeyDown);
        assert_eq!(events[1].r#type, KeyEventType::KeyUp);
    }

    #[test]
    fn printable_char_generates_text() {
        let key = resolve("a").unwrap();
        assert_eq!(key.text.as_deref(), Some("a"));
        let events = key.events();
        assert_eq!(events[0].r#type, KeyEventType::KeyDown);
        assert_eq!(events[0].text.as_deref(), Some("a"));
    }

    #[test]
    fn unknown_key_is_rejected() {
        assert!(resolve("NoSuchKey").is_err());
        assert!(resolve("").is_err());
    }
}
