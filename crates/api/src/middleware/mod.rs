//! Request extractors.
//!
//! - [`auth::AuthUser`]: the user a request acts for, from its bearer token.

pub mod auth;
