//! Session identity types.

use std::fmt;

/// Opaque per-visitor identifier correlating requests to a cart.
///
/// Issued by [`crate::middleware::session_identity_middleware`] and carried in
/// a signed cookie. `Debug` only shows a short prefix so that full tokens do
/// not end up in logs.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Wrap an already-issued identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as stored in the cookie and the `carts` table.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short, non-identifying prefix for log lines.
    #[must_use]
    pub fn short(&self) -> &str {
        self.0.get(..6).unwrap_or(&self.0)
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({}…)", self.short())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_truncates() {
        let id = SessionId::new("abcdefghijklmnopqrstuvwxyz");
        assert_eq!(format!("{id:?}"), "SessionId(abcdef…)");
        assert_eq!(id.as_str(), "abcdefghijklmnopqrstuvwxyz");
    }

    #[test]
    fn test_short_handles_short_ids() {
        assert_eq!(SessionId::new("ab").short(), "ab");
    }
}
