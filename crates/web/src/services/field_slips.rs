//! Field slip validation.
//!
//! A field slip code is `PREFIX-NNNN`, stored upper-case. When the prefix
//! belongs to a project the slip is attached to it.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use sqlx::SqlitePool;
use thiserror::Error;

use mycoflora_core::{FieldSlipId, Locale, ObservationId, ProjectId, UserId};

use crate::db::RepositoryError;
use crate::db::field_slips::{FieldSlip, FieldSlipFields};
use crate::db::{FieldSlipRepository, ObservationRepository, ProjectRepository};
use crate::i18n::Catalog;

static CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z0-9]+)-(\d+)$").expect("Invalid regex"));

/// Field slip form fields, named `field_slip[...]` on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FieldSlipForm {
    #[serde(rename = "field_slip[code]", default)]
    pub code: String,
    #[serde(rename = "field_slip[observation_id]", default)]
    pub observation_id: String,
    #[serde(rename = "field_slip[project_id]", default)]
    pub project_id: String,
}

impl From<&FieldSlip> for FieldSlipForm {
    fn from(slip: &FieldSlip) -> Self {
        Self {
            code: slip.code.clone(),
            observation_id: slip.observation_id.map(|id| id.to_string()).unwrap_or_default(),
            project_id: slip.project_id.map(|id| id.to_string()).unwrap_or_default(),
        }
    }
}

/// One reason a field slip form was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSlipProblem {
    CodeInvalid,
    CodeTaken(String),
    ObservationMissing(String),
    ProjectMissing(String),
    PrefixMismatch { code: String, prefix: String },
}

impl FieldSlipProblem {
    /// Localized message for the form.
    #[must_use]
    pub fn message(&self, catalog: &Catalog, locale: &Locale) -> String {
        match self {
            Self::CodeInvalid => catalog.t(locale, "field_slip_code_invalid"),
            Self::CodeTaken(code) => {
                catalog.t_with(locale, "field_slip_code_taken", &[("code", code)])
            }
            Self::ObservationMissing(id) => {
                catalog.t_with(locale, "field_slip_observation_missing", &[("id", id)])
            }
            Self::ProjectMissing(id) => {
                catalog.t_with(locale, "field_slip_project_missing", &[("id", id)])
            }
            Self::PrefixMismatch { code, prefix } => catalog.t_with(
                locale,
                "field_slip_prefix_mismatch",
                &[("code", code), ("prefix", prefix)],
            ),
        }
    }
}

/// Errors saving a field slip.
#[derive(Debug, Error)]
pub enum FieldSlipError {
    #[error("invalid field slip: {0:?}")]
    Invalid(Vec<FieldSlipProblem>),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Trim and upper-case a code.
#[must_use]
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// The project prefix of a well-formed code.
#[must_use]
pub fn code_prefix(code: &str) -> Option<&str> {
    CODE_RE
        .captures(code)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Check a form and turn it into storable fields.
///
/// `except` is the slip being edited, whose own code does not count as taken.
///
/// # Errors
///
/// Returns `FieldSlipError::Invalid` listing every problem found, or
/// `FieldSlipError::Repository` if a lookup fails.
pub async fn validate(
    pool: &SqlitePool,
    form: &FieldSlipForm,
    except: Option<FieldSlipId>,
) -> Result<FieldSlipFields, FieldSlipError> {
    let mut problems = Vec::new();
    let code = normalize_code(&form.code);

    let prefix = code_prefix(&code).map(str::to_string);
    if prefix.is_none() {
        problems.push(FieldSlipProblem::CodeInvalid);
    } else if FieldSlipRepository::new(pool).code_taken(&code, except).await? {
        problems.push(FieldSlipProblem::CodeTaken(code.clone()));
    }

    let observation_id = match optional_id::<ObservationId>(&form.observation_id) {
        Ok(None) => None,
        Ok(Some(id)) if ObservationRepository::new(pool).exists(id).await? => Some(id),
        Ok(Some(_)) | Err(()) => {
            problems.push(FieldSlipProblem::ObservationMissing(
                form.observation_id.trim().to_string(),
            ));
            None
        }
    };

    let projects = ProjectRepository::new(pool);
    let project_id = match optional_id::<ProjectId>(&form.project_id) {
        Ok(None) => match &prefix {
            Some(prefix) => projects.get_by_prefix(prefix).await?.map(|p| p.id),
            None => None,
        },
        Ok(Some(id)) => match projects.get(id).await? {
            Some(project) => {
                if prefix
                    .as_deref()
                    .is_some_and(|p| p != project.field_slip_prefix)
                {
                    problems.push(FieldSlipProblem::PrefixMismatch {
                        code: code.clone(),
                        prefix: project.field_slip_prefix.clone(),
                    });
                }
                Some(project.id)
            }
            None => {
                problems.push(FieldSlipProblem::ProjectMissing(id.to_string()));
                None
            }
        },
        Err(()) => {
            problems.push(FieldSlipProblem::ProjectMissing(
                form.project_id.trim().to_string(),
            ));
            None
        }
    };

    if problems.is_empty() {
        Ok(FieldSlipFields {
            code,
            observation_id,
            project_id,
        })
    } else {
        Err(FieldSlipError::Invalid(problems))
    }
}

fn optional_id<T: std::str::FromStr>(raw: &str) -> Result<Option<T>, ()> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse().map(Some).map_err(|_| ())
}

/// Validate and create a slip owned by `user_id`.
///
/// # Errors
///
/// See [`validate`]. A code claimed concurrently is reported as taken.
pub async fn create_field_slip(
    pool: &SqlitePool,
    form: &FieldSlipForm,
    user_id: UserId,
) -> Result<FieldSlip, FieldSlipError> {
    let fields = validate(pool, form, None).await?;
    let slip = FieldSlipRepository::new(pool)
        .create(&fields, user_id)
        .await
        .map_err(|e| taken_on_conflict(e, &fields.code))?;

    tracing::info!(field_slip_id = %slip.id, code = %slip.code, "Field slip created");
    Ok(slip)
}

/// Validate and update an existing slip.
///
/// # Errors
///
/// See [`validate`]; `Repository(NotFound)` when the slip vanished.
pub async fn update_field_slip(
    pool: &SqlitePool,
    id: FieldSlipId,
    form: &FieldSlipForm,
) -> Result<FieldSlip, FieldSlipError> {
    let fields = validate(pool, form, Some(id)).await?;
    let slip = FieldSlipRepository::new(pool)
        .update(id, &fields)
        .await
        .map_err(|e| taken_on_conflict(e, &fields.code))?;

    tracing::info!(field_slip_id = %slip.id, code = %slip.code, "Field slip updated");
    Ok(slip)
}

fn taken_on_conflict(err: RepositoryError, code: &str) -> FieldSlipError {
    match err {
        RepositoryError::Conflict(_) => {
            FieldSlipError::Invalid(vec![FieldSlipProblem::CodeTaken(code.to_string())])
        }
        other => FieldSlipError::Repository(other),
    }
}
