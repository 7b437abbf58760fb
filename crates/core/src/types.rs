/// Opaque user identifier issued by the identity provider (Firebase `uid`).
pub type UserId = String;

/// UTC timestamp used for operation bookkeeping.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
