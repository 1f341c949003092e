//! Translation catalogs and the request-scoped locale.
//!
//! Catalogs are flat JSON objects embedded at build time from
//! `crates/web/locales/`. Lookup tries the exact locale, then its language,
//! then the configured default, and finally returns the key itself.
//!
//! The locale chosen for a request is carried explicitly in the
//! [`RequestContext`](crate::models::RequestContext) and is also installed as
//! task-local state with [`scope`] so code without access to the context
//! (error responses) can localize. The task-local value only exists while the
//! scoped future runs, so it cannot outlive the request.

pub mod resolver;

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use mycoflora_core::Locale;
use thiserror::Error;

pub use resolver::{LocaleSource, LocaleSources, Resolution, resolve};

/// Embedded catalogs, keyed by locale code.
const EMBEDDED: &[(&str, &str)] = &[
    ("en", include_str!("../../locales/en.json")),
    ("fr", include_str!("../../locales/fr.json")),
    ("pt", include_str!("../../locales/pt.json")),
    ("es", include_str!("../../locales/es.json")),
    ("de", include_str!("../../locales/de.json")),
];

/// Errors loading a catalog.
#[derive(Debug, Error)]
pub enum I18nError {
    /// A catalog is not valid JSON or not a flat string map.
    #[error("invalid catalog for {locale}: {source}")]
    InvalidCatalog {
        locale: String,
        #[source]
        source: serde_json::Error,
    },
}

type Table = HashMap<String, String>;

/// Loaded translations plus the fallback locale.
///
/// Cheap to clone; the tables are shared.
#[derive(Debug, Clone)]
pub struct Catalog {
    tables: Arc<HashMap<String, Table>>,
    default_locale: Locale,
}

impl Catalog {
    /// Parse the embedded catalogs.
    ///
    /// # Errors
    ///
    /// Returns `I18nError::InvalidCatalog` if any embedded file is malformed.
    pub fn embedded(default_locale: Locale) -> Result<Self, I18nError> {
        let mut tables = HashMap::with_capacity(EMBEDDED.len());
        for (code, raw) in EMBEDDED {
            let table: Table =
                serde_json::from_str(raw).map_err(|source| I18nError::InvalidCatalog {
                    locale: (*code).to_string(),
                    source,
                })?;
            tables.insert((*code).to_string(), table);
        }

        Ok(Self {
            tables: Arc::new(tables),
            default_locale,
        })
    }

    /// The locale used when a key is missing from the requested one.
    #[must_use]
    pub const fn default_locale(&self) -> &Locale {
        &self.default_locale
    }

    /// Whether a catalog exists for the locale or its language.
    #[must_use]
    pub fn has_locale(&self, locale: &Locale) -> bool {
        self.tables.contains_key(locale.as_str()) || self.tables.contains_key(locale.language())
    }

    /// Translate `key` for `locale`.
    #[must_use]
    pub fn t(&self, locale: &Locale, key: &str) -> String {
        self.lookup(locale, key).unwrap_or(key).to_string()
    }

    /// Translate `key` and substitute `{name}` placeholders.
    #[must_use]
    pub fn t_with(&self, locale: &Locale, key: &str, args: &[(&str, &str)]) -> String {
        let mut text = self.t(locale, key);
        for (name, value) in args {
            text = text.replace(&format!("{{{name}}}"), value);
        }
        text
    }

    fn lookup(&self, locale: &Locale, key: &str) -> Option<&str> {
        [
            locale.as_str(),
            locale.language(),
            self.default_locale.as_str(),
        ]
        .into_iter()
        .find_map(|code| self.tables.get(code)?.get(key))
        .map(String::as_str)
    }
}

#[derive(Clone)]
struct LocaleScope {
    locale: Locale,
    catalog: Catalog,
}

tokio::task_local! {
    static CURRENT: LocaleScope;
}

/// Run `fut` with `locale` installed as the current locale.
///
/// The previous value (if any) is restored when `fut` completes, panics or
/// is dropped.
pub async fn scope<F>(locale: Locale, catalog: Catalog, fut: F) -> F::Output
where
    F: Future,
{
    CURRENT.scope(LocaleScope { locale, catalog }, fut).await
}

/// The locale installed by the innermost [`scope`], if any.
#[must_use]
pub fn current_locale() -> Option<Locale> {
    CURRENT.try_with(|s| s.locale.clone()).ok()
}

/// Translate `key` in the current scope.
///
/// Outside a scope the `fallback` text is returned unchanged.
#[must_use]
pub fn localize(key: &str, fallback: &str) -> String {
    CURRENT
        .try_with(|s| {
            s.catalog
                .lookup(&s.locale, key)
                .map_or_else(|| fallback.to_string(), str::to_string)
        })
        .unwrap_or_else(|_| fallback.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::embedded(Locale::default()).unwrap()
    }

    fn locale(code: &str) -> Locale {
        Locale::parse(code).unwrap()
    }

    #[test]
    fn test_embedded_catalogs_parse() {
        let catalog = catalog();
        for (code, _) in EMBEDDED {
            assert!(catalog.has_locale(&locale(code)), "{code} missing");
        }
    }

    #[test]
    fn test_every_english_key_is_non_empty() {
        let catalog = catalog();
        let en = catalog.tables.get("en").unwrap();
        assert!(en.contains_key("permission_denied"));
        assert!(en.values().all(|v| !v.trim().is_empty()));
    }

    #[test]
    fn test_translations_only_use_english_keys() {
        let catalog = catalog();
        let en = catalog.tables.get("en").unwrap();
        for (code, table) in catalog.tables.iter() {
            for key in table.keys() {
                assert!(en.contains_key(key), "{code} has unknown key {key}");
            }
        }
    }

    #[test]
    fn test_lookup_falls_back_through_language_default_and_key() {
        let catalog = catalog();
        assert_ne!(
            catalog.t(&locale("fr"), "permission_denied"),
            catalog.t(&locale("en"), "permission_denied")
        );
        assert_eq!(
            catalog.t(&locale("pt-BR"), "permission_denied"),
            catalog.t(&locale("pt"), "permission_denied")
        );
        assert_eq!(
            catalog.t(&locale("ja"), "permission_denied"),
            catalog.t(&locale("en"), "permission_denied")
        );
        assert_eq!(catalog.t(&locale("en"), "no_such_key"), "no_such_key");
    }

    #[test]
    fn test_placeholders_are_substituted() {
        let catalog = catalog();
        let text = catalog.t_with(&locale("en"), "login_success", &[("login", "mary")]);
        assert!(text.contains("mary"));
        assert!(!text.contains("{login}"));
    }

    #[tokio::test]
    async fn test_scope_is_released_after_the_future() {
        assert!(current_locale().is_none());

        let inside = scope(locale("fr"), catalog(), async { current_locale() }).await;
        assert_eq!(inside, Some(locale("fr")));
        assert!(current_locale().is_none());

        let text = scope(locale("fr"), catalog(), async {
            localize("internal_error", "Internal server error")
        })
        .await;
        assert_ne!(text, "Internal server error");
        assert_eq!(
            localize("internal_error", "Internal server error"),
            "Internal server error"
        );
    }

    #[tokio::test]
    async fn test_scopes_do_not_leak_between_tasks() {
        let fr = tokio::spawn(scope(locale("fr"), catalog(), async {
            tokio::task::yield_now().await;
            current_locale()
        }));
        let es = tokio::spawn(scope(locale("es"), catalog(), async {
            tokio::task::yield_now().await;
            current_locale()
        }));

        assert_eq!(fr.await.unwrap(), Some(locale("fr")));
        assert_eq!(es.await.unwrap(), Some(locale("es")));
    }
}
