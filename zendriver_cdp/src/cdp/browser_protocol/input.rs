//! Dispatches synthesized input events to the page.
//! [Input](https://chromedevtools.github.io/devtools-protocol/tot/Input/)

use serde::{Deserialize, Serialize};

use crate::cdp::cdp_command;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MouseEventType {
    #[serde(rename = "mousePressed")]
    MousePressed,
    #[serde(rename = "mouseReleased")]
    MouseReleased,
    #[serde(rename = "mouseMoved")]
    MouseMoved,
    #[serde(rename = "mouseWheel")]
    MouseWheel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    #[default]
    None,
    Left,
    Middle,
    Right,
    Back,
    Forward,
}

/// Dispatches a mouse event to the page.
/// [dispatchMouseEvent](https://chromedevtools.github.io/devtools-protocol/tot/Input/#method-dispatchMouseEvent)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchMouseEventParams {
    pub r#type: MouseEventType,
    /// X coordinate of the event relative to the main frame's viewport in CSS
    /// pixels.
    pub x: f64,
    /// Y coordinate of the event relative to the main frame's viewport in CSS
    /// pixels. 0 refers to the top of the viewport and Y increases as it
    /// proceeds towards the bottom of the viewport.
    pub y: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub button: Option<MouseButton>,
    /// A number indicating which buttons are pressed on the mouse when a mouse
    /// event is triggered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buttons: Option<i64>,
    /// Number of times the mouse button was clicked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub click_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta_x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta_y: Option<f64>,
    /// Bit field representing pressed modifier keys.
    /// Alt=1, Ctrl=2, Meta/Command=4, Shift=8 (default: 0).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifiers: Option<i64>,
}

impl DispatchMouseEventParams {
    pub fn new(r#type: MouseEventType, x: f64, y: f64) -> Self {
        Self {
            r#type,
            x,
            y,
            button: None,
            buttons: None,
            click_count: None,
            delta_x: None,
            delta_y: None,
            modifiers: None,
        }
    }

    pub fn button(mut self, button: MouseButton) -> Self {
        self.button = Some(button);
        self
    }

    pub fn click_count(mut self, count: i64) -> Self {
        self.click_count = Some(count);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DispatchMouseEventReturns {}

cdp_command!(
    DispatchMouseEventParams,
    "Input.dispatchMouseEvent",
    DispatchMouseEventReturns
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyEventType {
    #[serde(rename = "keyDown")]
    KeyDown,
    #[serde(rename = "keyUp")]
    KeyUp,
    /// Key down without text, used for non-printable keys.
    #[serde(rename = "rawKeyDown")]
    RawKeyDown,
    #[serde(rename = "char")]
    Char,
}

/// Dispatches a key event to the page.
/// [dispatchKeyEvent](https://chromedevtools.github.io/devtools-protocol/tot/Input/#method-dispatchKeyEvent)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchKeyEventParams {
    pub r#type: KeyEventType,
    /// Bit field representing pressed modifier keys.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifiers: Option<i64>,
    /// Text as generated by processing a virtual key code with a keyboard
    /// layout. Not needed for `keyUp` and `rawKeyDown` events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Text that would have been generated by the keyboard if no modifiers
    /// were pressed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unmodified_text: Option<String>,
    /// Unique DOM defined string value for each physical key (e.g., 'KeyA').
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Unique DOM defined string value describing the meaning of the key
    /// (e.g., 'AltGr').
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Windows virtual key code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub windows_virtual_key_code: Option<i64>,
    /// Native virtual key code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub native_virtual_key_code: Option<i64>,
    /// Whether the event was generated from the keypad.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_keypad: Option<bool>,
    /// Whether the key is on the numpad, as seen by the DOM `location`
    /// attribute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<i64>,
}

impl DispatchKeyEventParams {
    pub fn new(r#type: KeyEventType) -> Self {
        Self {
            r#type,
            modifiers: None,
            text: None,
            unmodified_text: None,
            code: None,
            key: None,
            windows_virtual_key_code: None,
            native_virtual_key_code: None,
            is_keypad: None,
            location: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DispatchKeyEventReturns {}

cdp_command!(
    DispatchKeyEventParams,
    "Input.dispatchKeyEvent",
    DispatchKeyEventReturns
);

/// Emulates inserting text that doesn't come from a key press, for example an
/// emoji keyboard or an IME.
/// [insertText](https://chromedevtools.github.io/devtools-protocol/tot/Input/#method-insertText)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertTextParams {
    pub text: String,
}

impl InsertTextParams {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InsertTextReturns {}

cdp_command!(InsertTextParams, "Input.insertText", InsertTextReturns);
