//! Career Champ core library.
//!
//! Client-side pieces shared by every Career Champ front end:
//! - `auth`: bearer token storage, token validation and the session lifecycle
//! - `api`: REST client for the Career Champ backend
//! - `models`: request/response types for the backend endpoints
//! - `config`: on-disk client configuration
//! - `interview`: interview practice questions and mock scoring

pub mod api;
pub mod auth;
pub mod config;
pub mod interview;
pub mod models;

pub use api::{ApiClient, ApiError};
pub use auth::{AuthError, Claims, SessionController, SessionState, SessionView};
pub use config::Config;
