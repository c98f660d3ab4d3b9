use std::any::Any;
use std::sync::Arc;

use zendriver_types::{CdpJsonEventMessage, Method};

pub mod browser_protocol;
pub mod events;
pub mod js_protocol;

pub use events::{CdpEvent, CdpEventMessage};

/// An object safe marker implemented by every typed cdp event, so events can
/// travel the bus as `Arc<dyn Event>` and be downcast back by subscribers.
pub trait Event: Method + std::fmt::Debug + Send + Sync + Any {
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// Typed events with a statically known identifier; what subscriptions key
/// on.
pub trait EventKind: Event {
    /// The `Domain.event` identifier of this event type.
    fn event_identifier() -> zendriver_types::MethodId
    where
        Self: Sized;
}

/// Raw json events participate in the bus like any typed event.
impl Event for CdpJsonEventMessage {
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// Declares a newtype for a protocol string identifier.
macro_rules! cdp_string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn inner(&self) -> &String {
                &self.0
            }

            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.0.as_str()
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                self.0.as_str()
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

/// Wires a params struct to its method identifier and response type.
macro_rules! cdp_command {
    ($params:ident, $identifier:literal, $returns:ident) => {
        impl $params {
            pub const IDENTIFIER: &'static str = $identifier;
        }

        impl zendriver_types::Method for $params {
            fn identifier(&self) -> zendriver_types::MethodId {
                Self::IDENTIFIER.into()
            }
        }

        impl zendriver_types::Command for $params {
            type Response = $returns;
        }
    };
}

/// Wires an event struct to its method identifier and the bus marker trait.
macro_rules! cdp_event {
    ($event:ident, $identifier:literal) => {
        impl $event {
            pub const IDENTIFIER: &'static str = $identifier;
        }

        impl zendriver_types::Method for $event {
            fn identifier(&self) -> zendriver_types::MethodId {
                Self::IDENTIFIER.into()
            }
        }

        impl $crate::cdp::Event for $event {
            fn into_any_arc(
                self: std::sync::Arc<Self>,
            ) -> std::sync::Arc<dyn std::any::Any + Send + Sync> {
                self
            }
        }

        impl $crate::cdp::EventKind for $event {
            fn event_identifier() -> zendriver_types::MethodId {
                Self::IDENTIFIER.into()
            }
        }
    };
}

pub(crate) use cdp_command;
pub(crate) use cdp_event;
pub(crate) use cdp_string_id;
