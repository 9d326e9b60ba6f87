//! Authentication hook for stamping a verified identity.
//!
//! Duet doesn't implement authentication itself — that belongs to an
//! external collaborator (an OAuth provider, a JWT issuer, whatever the
//! deployment uses). The [`Authenticator`] trait is the seam: a single
//! async method that takes the raw token a client presented at connect
//! time and returns a verified [`Identity`] or an error.
//!
//! Connections without a token skip authentication entirely and pair
//! anonymously; the trait is only consulted when a token is present.

use crate::{Identity, SessionError};

/// Validates a client's auth token and returns a verified identity.
///
/// `Send + Sync + 'static` because the authenticator is shared across
/// connection handler tasks for the lifetime of the server.
pub trait Authenticator: Send + Sync + 'static {
    /// Validates the given token.
    ///
    /// # Returns
    /// - `Ok(Identity)` — the token checked out; here's who this is
    /// - `Err(SessionError::AuthFailed)` — token invalid or expired; the
    ///   connection is rejected before it reaches the core
    fn authenticate(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<Identity, SessionError>> + Send;
}

/// An [`Authenticator`] that accepts every token and uses it verbatim as
/// the subject.
///
/// Development and test use only — a real deployment verifies the token
/// against its auth provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrustingAuthenticator;

impl Authenticator for TrustingAuthenticator {
    async fn authenticate(&self, token: &str) -> Result<Identity, SessionError> {
        if token.is_empty() {
            return Err(SessionError::AuthFailed("empty token".into()));
        }
        Ok(Identity {
            subject: token.to_string(),
            display_name: None,
        })
    }
}
