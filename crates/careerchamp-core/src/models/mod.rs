//! Data models for the Career Champ backend.
//!
//! - `account`: login/registration requests and token responses
//! - `job`: job listings and search
//! - `chat`: chatbot sessions and messages
//! - `resume`: accepted resume formats
//! - `Ping`: backend liveness reply

use serde::{Deserialize, Serialize};

pub mod account;
pub mod chat;
pub mod job;
pub mod resume;

pub use account::{LoginRequest, RegisterRequest, RegisterResponse, TokenResponse};
pub use chat::{ChatReply, ChatRequest, ChatSession, ChatSessionSummary};
pub use job::{search_query, Job, JobSearchRequest, JobsResponse};
pub use resume::ResumeFormat;

/// Reply from `GET /ping`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ping {
    pub message: String,
}
