//! Request extractors for authentication and quota enforcement.
//!
//! - [`auth::AuthUser`] -- Verifies the Bearer token and yields the caller.
//! - [`quota::QuotaUser`] -- Authenticates, then consumes one unit of the
//!   caller's daily generation quota.

pub mod auth;
pub mod quota;
