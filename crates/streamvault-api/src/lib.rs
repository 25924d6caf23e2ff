//! StreamVault HTTP API
//!
//! Upload, listing, streaming and deletion of videos over axum. The binary in `main.rs`
//! only loads configuration and hands over to [`setup::initialize_app`].

pub mod api_doc;
pub mod error;
pub mod handlers;
pub mod setup;
pub mod state;
pub mod telemetry;

pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
