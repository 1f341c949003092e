//! Seed the database with reference data.
//!
//! Reads names, licenses, projects and contest entries from a YAML file and
//! inserts them. Rows that already exist are skipped, so a seed file can be
//! applied repeatedly.
//!
//! ```yaml
//! names:
//!   - text_name: Amanita muscaria
//!     author: (L.) Lam.
//! licenses:
//!   - display_name: Creative Commons Attribution-ShareAlike 4.0
//!     form_name: ccbysa40
//!     url: https://creativecommons.org/licenses/by-sa/4.0/
//! projects:
//!   - title: North East Mushroom Foray
//!     field_slip_prefix: NEMF
//!     owner: mary
//! contest_entries:
//!   - title: Morning light
//!     description: Mycena on birch
//! ```

use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use mycoflora_web::db::licenses::NewLicense;
use mycoflora_web::db::{
    ContestRepository, LicenseRepository, NameRepository, ProjectRepository, RepositoryError,
    UserRepository,
};

use super::connect;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedFile {
    #[serde(default)]
    pub names: Vec<SeedName>,
    #[serde(default)]
    pub licenses: Vec<SeedLicense>,
    #[serde(default)]
    pub projects: Vec<SeedProject>,
    #[serde(default)]
    pub contest_entries: Vec<SeedContestEntry>,
}

#[derive(Debug, Deserialize)]
pub struct SeedName {
    pub text_name: String,
    #[serde(default)]
    pub author: String,
}

#[derive(Debug, Deserialize)]
pub struct SeedLicense {
    pub display_name: String,
    pub form_name: String,
    pub url: String,
    #[serde(default)]
    pub deprecated: bool,
}

#[derive(Debug, Deserialize)]
pub struct SeedProject {
    pub title: String,
    pub field_slip_prefix: String,
    /// Login of the owning user, who must already exist.
    pub owner: String,
}

#[derive(Debug, Deserialize)]
pub struct SeedContestEntry {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Inserted and skipped row counts.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedResult {
    pub inserted: usize,
    pub skipped: usize,
}

impl SeedResult {
    fn record(
        &mut self,
        outcome: Result<(), RepositoryError>,
        what: &str,
    ) -> Result<(), RepositoryError> {
        match outcome {
            Ok(()) => self.inserted += 1,
            Err(RepositoryError::Conflict(_)) => {
                info!("  skipped existing {what}");
                self.skipped += 1;
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }
}

/// Problems that make a seed file unusable, found before touching the database.
#[must_use]
pub fn validate(seed: &SeedFile) -> Vec<String> {
    let mut errors = Vec::new();
    for name in &seed.names {
        if name.text_name.trim().is_empty() {
            errors.push("name with blank text_name".to_string());
        }
    }
    for license in &seed.licenses {
        if license.form_name.trim().is_empty() {
            errors.push(format!(
                "license {:?} has a blank form_name",
                license.display_name
            ));
        }
        if url::Url::parse(&license.url).is_err() {
            errors.push(format!("license {:?} has an invalid url", license.form_name));
        }
    }
    for project in &seed.projects {
        let prefix = &project.field_slip_prefix;
        let well_formed = !prefix.is_empty()
            && prefix
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit());
        if !well_formed {
            errors.push(format!(
                "project {:?} has an invalid prefix {prefix:?}",
                project.title
            ));
        }
    }
    for entry in &seed.contest_entries {
        if entry.title.trim().is_empty() {
            errors.push("contest entry with blank title".to_string());
        }
    }
    errors
}

/// Load and apply a seed file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, fails validation,
/// names an unknown project owner, or a database operation fails.
pub async fn run(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading seed file");
    let content = tokio::fs::read_to_string(path).await?;
    let seed: SeedFile = serde_yaml::from_str(&content)?;

    let errors = validate(&seed);
    if !errors.is_empty() {
        for err in &errors {
            warn!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    let pool = connect().await?;
    let mut result = SeedResult::default();

    let names = NameRepository::new(&pool);
    for name in &seed.names {
        let outcome = names.create(&name.text_name, &name.author).await.map(|_| ());
        result.record(outcome, &format!("name {}", name.text_name))?;
    }

    let licenses = LicenseRepository::new(&pool);
    for license in &seed.licenses {
        let outcome = licenses
            .create(&NewLicense {
                display_name: license.display_name.clone(),
                form_name: license.form_name.clone(),
                url: license.url.clone(),
                deprecated: license.deprecated,
            })
            .await
            .map(|_| ());
        result.record(outcome, &format!("license {}", license.form_name))?;
    }

    let users = UserRepository::new(&pool);
    let projects = ProjectRepository::new(&pool);
    for project in &seed.projects {
        let owner = users
            .get_by_login(&project.owner)
            .await?
            .ok_or_else(|| format!("unknown project owner: {}", project.owner))?;
        if projects.get_by_prefix(&project.field_slip_prefix).await?.is_some() {
            result.skipped += 1;
            continue;
        }
        let outcome = projects
            .create(&project.title, &project.field_slip_prefix, owner.id)
            .await
            .map(|_| ());
        result.record(outcome, &format!("project {}", project.title))?;
    }

    let contest = ContestRepository::new(&pool);
    let existing: Vec<String> = contest
        .list_entries()
        .await?
        .into_iter()
        .map(|e| e.title)
        .collect();
    for entry in &seed.contest_entries {
        if existing.contains(&entry.title) {
            result.skipped += 1;
            continue;
        }
        contest.create_entry(&entry.title, &entry.description).await?;
        result.inserted += 1;
    }

    info!("Seeding complete!");
    info!("  Rows inserted: {}", result.inserted);
    info!("  Rows skipped (already exist): {}", result.skipped);
    Ok(())
}
