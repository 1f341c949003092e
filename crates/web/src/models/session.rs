//! Session-related types.
//!
//! Everything the site remembers between requests lives under these keys.

use serde::{Deserialize, Serialize};

/// Session keys.
pub mod keys {
    /// ID of the logged-in user.
    pub const USER_ID: &str = "user_id";

    /// Whether the session asked for admin mode. Only honoured for admins.
    pub const ADMIN: &str = "admin";

    /// Forced JavaScript setting, absent when the browser decides.
    pub const JS_OVERRIDE: &str = "js_override";

    /// Locale chosen through the `user_locale` parameter.
    pub const LOCALE: &str = "locale";

    /// Messages to show on the next rendered page.
    pub const FLASH: &str = "flash";
}

/// Forced JavaScript setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsOverride {
    On,
    Off,
}

impl JsOverride {
    /// Session and template spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Off => "off",
        }
    }
}

/// Severity of a flash message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Notice,
    Warning,
    Error,
}

impl FlashKind {
    /// CSS class for the message box.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Notice => "notice",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// An already-localized message shown once on the next page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub kind: FlashKind,
    pub text: String,
}

impl FlashMessage {
    #[must_use]
    pub fn notice(text: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Notice,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Warning,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            text: text.into(),
        }
    }
}
