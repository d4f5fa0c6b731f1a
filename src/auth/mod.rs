//! Sign-in against the identity provider
//!
//! A cached token in `token.json` is reused until shortly before it
//! expires, then refreshed. Without a usable token the browser sign-in
//! flow in `oauth` runs.

pub mod oauth;
pub mod token;

pub use token::{access_token, StoredToken};
