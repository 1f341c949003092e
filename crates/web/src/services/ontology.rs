//! Client for the remote name ontology service.
//!
//! The service answers `GET {base}/lookup?label=<name>` with the matching term
//! as JSON, or 404 when it has none. Every failure mode is returned as a value
//! so callers can degrade to a redirect.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Request timeout for lookups.
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors talking to the ontology service.
#[derive(Debug, Error)]
pub enum OntologyError {
    /// No service URL is configured.
    #[error("ontology service is not configured")]
    NotConfigured,

    /// The request could not be completed (connect error, timeout).
    #[error("ontology service unreachable: {0}")]
    Unreachable(#[from] reqwest::Error),

    /// The service answered with an error status or an unreadable body.
    #[error("bad response from ontology service: {0}")]
    BadResponse(String),
}

/// A term returned by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OntologyTerm {
    /// Term identifier.
    pub iri: String,
    pub label: String,
    #[serde(default)]
    pub definition: Option<String>,
}

/// Ontology lookup client.
#[derive(Debug, Clone)]
pub struct OntologyClient {
    client: reqwest::Client,
    base_url: Option<Url>,
}

impl OntologyClient {
    /// Create a client; `None` yields a client whose lookups fail with
    /// `OntologyError::NotConfigured`.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(base_url: Option<Url>) -> Result<Self, OntologyError> {
        let client = reqwest::Client::builder()
            .timeout(LOOKUP_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.map(with_trailing_slash),
        })
    }

    /// Look up the term for a name label.
    ///
    /// # Errors
    ///
    /// Returns `NotConfigured`, `Unreachable` or `BadResponse`; a missing term
    /// is `Ok(None)`.
    pub async fn lookup(&self, label: &str) -> Result<Option<OntologyTerm>, OntologyError> {
        let url = self.lookup_url(label)?;

        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(OntologyError::BadResponse(format!("status {status}")));
        }

        let term: OntologyTerm = response
            .json()
            .await
            .map_err(|e| OntologyError::BadResponse(e.to_string()))?;
        Ok(Some(term))
    }

    fn lookup_url(&self, label: &str) -> Result<Url, OntologyError> {
        let base = self.base_url.as_ref().ok_or(OntologyError::NotConfigured)?;
        let mut url = base
            .join("lookup")
            .map_err(|e| OntologyError::BadResponse(e.to_string()))?;
        url.query_pairs_mut().append_pair("label", label);
        Ok(url)
    }
}

/// `Url::join` replaces the last segment unless the path ends in `/`.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
