//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::SqlitePool;
use thiserror::Error;

use crate::config::SiteConfig;
use crate::i18n::{Catalog, I18nError};
use crate::services::email::EmailService;
use crate::services::ontology::{OntologyClient, OntologyError};

/// Error building application state.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("translation catalog error: {0}")]
    Catalog(#[from] I18nError),
    #[error("ontology client error: {0}")]
    Ontology(#[from] OntologyError),
    #[error("smtp transport error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Everything inside is immutable after startup.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: SiteConfig,
    pool: SqlitePool,
    catalog: Catalog,
    mailer: Option<EmailService>,
    ontology: OntologyClient,
}

impl AppState {
    /// Create the application state.
    ///
    /// Mail delivery is enabled only when SMTP is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalogs are malformed or a client cannot be built.
    pub fn new(config: SiteConfig, pool: SqlitePool) -> Result<Self, StateError> {
        let catalog = Catalog::embedded(config.i18n.default_locale.clone())?;
        let mailer = config
            .email
            .as_ref()
            .map(EmailService::new)
            .transpose()?;
        let ontology = OntologyClient::new(config.ontology_url.clone())?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                catalog,
                mailer,
                ontology,
            }),
        })
    }

    /// Get a reference to the site configuration.
    #[must_use]
    pub fn config(&self) -> &SiteConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.inner.pool
    }

    /// Get a reference to the translation catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    /// The mailer, when SMTP is configured.
    #[must_use]
    pub fn mailer(&self) -> Option<&EmailService> {
        self.inner.mailer.as_ref()
    }

    /// Get a reference to the ontology service client.
    #[must_use]
    pub fn ontology(&self) -> &OntologyClient {
        &self.inner.ontology
    }
}
