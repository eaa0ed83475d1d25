//! Session management.
//!
//! This module provides:
//! - `SessionStore`: access token, refresh token and cached user profile,
//!   with a subscription interface for auth state changes
//! - `KeyValueStore`: the persistent area behind the session, backed by a
//!   JSON file (`FileStore`), the OS keychain (`KeyringStore`) or memory

pub mod credentials;
pub mod session;
pub mod storage;

pub use credentials::KeyringStore;
pub use session::{AuthEvent, ListenerId, LogoutReason, SessionStore};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
