//! Error codes shared by services and routes.

/// Grepable error code attached to every failure surfaced over HTTP.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    /// Numeric `error` field used in the response envelope.
    fn envelope_code(&self) -> i64 {
        1
    }
}
