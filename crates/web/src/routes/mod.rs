//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                                  - Recent observations
//! GET  /health                            - Liveness
//! GET  /health/ready                      - Database ping
//!
//! # Account
//! GET  /account                           - Redirect to preferences
//! GET  /account/login                     - Login form
//! POST /account/login                     - Log in
//! POST /account/logout                    - Log out
//! GET  /account/preferences               - Locale preference (login)
//! POST /account/preferences               - Save locale preference (login)
//!
//! # Session toggles (always redirect back)
//! GET  /admin_mode?turn_on=1|turn_off=1   - Admin mode
//! GET  /javascript/turn_on|turn_off|turn_nil
//!
//! # Info
//! GET  /info/intro|how_to_help|how_to_use|news|site_stats
//!
//! # Donations
//! GET  /support/donate                    - Donation form
//! GET  /support/confirm                   - Record a donation (query)
//! POST /support/confirm                   - Record a donation (form)
//! GET  /support/donors                    - Public donor list
//!
//! # Contest
//! GET  /contest_ballots                   - Ballot (login)
//! POST /contest_ballots                   - Cast ballot (login)
//! GET  /contest_entries[/new|/{id}]       - Admin mode
//! POST /contest_entries                   - Create (admin mode)
//! POST /contest_entries/{id}/destroy      - Delete (admin mode)
//!
//! # Licenses (admin mode)
//! GET  /licenses[/new|/{id}]
//! POST /licenses
//! POST /licenses/{id}/destroy
//!
//! # Field slips (login; HTML, JSON or Turbo Stream)
//! GET  /field_slips                       - Index
//! POST /field_slips                       - Create
//! GET  /field_slips/new                   - Form
//! GET  /field_slips/{id}                  - Show
//! POST /field_slips/{id}                  - Update (owner or admin mode)
//! DELETE /field_slips/{id}                - Delete (owner or admin mode)
//! GET  /field_slips/{id}/edit             - Edit form
//! POST /field_slips/{id}/destroy          - Delete from an HTML form
//!
//! # Notifications (login)
//! GET  /notifications                     - Tracked names
//! POST /notifications                     - Track a name
//! POST /notifications/{id}/destroy        - Stop tracking
//! GET  /notifications/naming/{naming_id}  - Notes for a naming
//!
//! # Observations and names
//! GET  /observations                      - Index (robot friendly)
//! POST /observations                      - Create (login)
//! GET  /observations/new                  - Form (login)
//! GET  /observations/{id}                 - Show (robot friendly)
//! GET  /observations/{id}/namings/new     - Propose form (humans only)
//! POST /observations/{id}/namings         - Propose a name (humans only)
//! GET  /names/{id}                        - Show (robot friendly)
//! GET  /names/{id}/ontology               - Ontology lookup (robot friendly)
//! ```

pub mod account;
pub mod admin_mode;
pub mod contest_ballots;
pub mod contest_entries;
pub mod field_slips;
pub mod info;
pub mod javascript;
pub mod licenses;
pub mod names;
pub mod notifications;
pub mod observations;
pub mod support;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(account::index))
        .route("/login", get(account::login_page).post(account::login))
        .route("/logout", post(account::logout))
        .route(
            "/preferences",
            get(account::preferences_page).post(account::update_preferences),
        )
}

/// Create the JavaScript toggle routes router.
pub fn javascript_routes() -> Router<AppState> {
    Router::new()
        .route("/turn_on", get(javascript::turn_on))
        .route("/turn_off", get(javascript::turn_off))
        .route("/turn_nil", get(javascript::turn_nil))
}

/// Create the info page routes router.
pub fn info_routes() -> Router<AppState> {
    Router::new()
        .route("/intro", get(info::intro))
        .route("/how_to_help", get(info::how_to_help))
        .route("/how_to_use", get(info::how_to_use))
        .route("/news", get(info::news))
        .route("/site_stats", get(info::site_stats))
}

/// Create the donation routes router.
pub fn support_routes() -> Router<AppState> {
    Router::new()
        .route("/donate", get(support::donate))
        .route(
            "/confirm",
            get(support::confirm_query).post(support::confirm),
        )
        .route("/donors", get(support::donors))
}

/// Create the contest entry routes router.
pub fn contest_entry_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(contest_entries::index).post(contest_entries::create),
        )
        .route("/new", get(contest_entries::new))
        .route(
            "/{id}",
            get(contest_entries::show).delete(contest_entries::destroy),
        )
        .route("/{id}/destroy", post(contest_entries::destroy))
}

/// Create the license routes router.
pub fn license_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(licenses::index).post(licenses::create))
        .route("/new", get(licenses::new))
        .route("/{id}", get(licenses::show).delete(licenses::destroy))
        .route("/{id}/destroy", post(licenses::destroy))
}

/// Create the field slip routes router.
pub fn field_slip_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(field_slips::index).post(field_slips::create))
        .route("/new", get(field_slips::new))
        .route(
            "/{id}",
            get(field_slips::show)
                .post(field_slips::update)
                .patch(field_slips::update)
                .delete(field_slips::destroy),
        )
        .route("/{id}/edit", get(field_slips::edit))
        .route("/{id}/destroy", post(field_slips::destroy))
}

/// Create the notification routes router.
pub fn notification_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(notifications::index).post(notifications::create),
        )
        .route("/{id}/destroy", post(notifications::destroy))
        .route("/naming/{naming_id}", get(notifications::show_naming))
}

/// Create the observation routes router.
pub fn observation_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(observations::index).post(observations::create))
        .route("/new", get(observations::new))
        .route("/{id}", get(observations::show))
        .route("/{id}/namings/new", get(observations::new_naming))
        .route("/{id}/namings", post(observations::create_naming))
}

/// Create the name routes router.
pub fn name_routes() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(names::show))
        .route("/{id}/ontology", get(names::ontology))
}

/// Create all site routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(observations::home))
        .nest("/account", account_routes())
        .route("/admin_mode", get(admin_mode::toggle))
        .nest("/javascript", javascript_routes())
        .nest("/info", info_routes())
        .nest("/support", support_routes())
        .route(
            "/contest_ballots",
            get(contest_ballots::index).post(contest_ballots::create),
        )
        .nest("/contest_entries", contest_entry_routes())
        .nest("/licenses", license_routes())
        .nest("/field_slips", field_slip_routes())
        .nest("/notifications", notification_routes())
        .nest("/observations", observation_routes())
        .nest("/names", name_routes())
}
