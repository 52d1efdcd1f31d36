//! Authentication module for managing the client session and its token.
//!
//! This module provides:
//! - `claims`: payload decoding and expiry validation for bearer tokens
//! - `TokenStore`: persistence for the single bearer token (file, keychain, memory)
//! - `SessionController`: login/logout, startup restore and periodic expiry checks
//!
//! Tokens are never verified against a key on the client; the backend remains
//! the authority and rejects forged or stale tokens with a 401.

pub mod claims;
pub mod clock;
pub mod session;
pub mod store;

pub use claims::{decode_claims, validate, validate_at, Claims, DecodeError};
pub use clock::{Clock, ManualClock, SystemClock};
pub use session::{
    AuthError, SessionConfig, SessionController, SessionState, SessionView,
    DEFAULT_EXPIRY_CHECK_INTERVAL,
};
pub use store::{FileTokenStore, KeyringTokenStore, MemoryTokenStore, TokenStore, TOKEN_KEY};
