//! Locale precedence.
//!
//! Sources are tried in a fixed order and the first usable one wins:
//!
//! 1. the `user_locale` request parameter, ignored for ajax requests
//! 2. the logged-in user's stored preference, when non-blank
//! 3. the locale remembered in the session
//! 4. the configured default
//!
//! A candidate is usable only if it parses and is one of the supported
//! locales; anything else falls through to the next source.

use mycoflora_core::Locale;

use crate::config::I18nConfig;

/// Raw locale candidates gathered from a request.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocaleSources<'a> {
    /// Value of the `user_locale` query parameter.
    pub param: Option<&'a str>,
    /// Whether the request came from in-page script.
    pub ajax: bool,
    /// Stored preference of the logged-in user.
    pub user: Option<&'a str>,
    /// Locale remembered in the session.
    pub session: Option<&'a str>,
}

/// Which source supplied the resolved locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocaleSource {
    Param,
    User,
    Session,
    Default,
}

/// Outcome of locale resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub locale: Locale,
    pub source: LocaleSource,
}

/// Pick the locale for a request.
#[must_use]
pub fn resolve(sources: &LocaleSources<'_>, config: &I18nConfig) -> Resolution {
    let param = if sources.ajax { None } else { sources.param };

    [
        (param, LocaleSource::Param),
        (sources.user, LocaleSource::User),
        (sources.session, LocaleSource::Session),
    ]
    .into_iter()
    .find_map(|(raw, source)| {
        let locale = supported(raw?, config)?;
        Some(Resolution { locale, source })
    })
    .unwrap_or_else(|| Resolution {
        locale: config.default_locale.clone(),
        source: LocaleSource::Default,
    })
}

/// Parse `raw` and return it if it is a supported locale.
#[must_use]
pub fn supported(raw: &str, config: &I18nConfig) -> Option<Locale> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    Locale::parse(raw)
        .ok()
        .filter(|locale| config.supported.contains(locale))
}
