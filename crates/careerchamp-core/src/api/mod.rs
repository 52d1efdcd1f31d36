//! REST API client module for the Career Champ backend.
//!
//! This module provides the `ApiClient` for the backend endpoints used by the
//! client: authentication, job listings and search, resume upload, the
//! chatbot, and a liveness ping.
//!
//! The API uses JWT bearer token authentication; the token is read from the
//! shared `TokenStore` on each request.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
