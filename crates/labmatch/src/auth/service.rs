//! Session lifecycle: signup, signin, refresh, logout.

use tracing::{info, instrument};

use super::{AuthError, AuthState, Identity, Role, TokenPair};
use crate::auth::session::RefreshSessionStore;
use crate::user::{CreateUserRequest, User, UserRepository};

/// Orchestrates the session lifecycle by composing the user repository, the
/// token issuer and the refresh session store.
///
/// Every operation here is a single persistence write, so no partial-failure
/// state is possible; failures surface as errors and the client re-issues
/// the whole operation.
/// Whether a repository error was a schema unique-constraint failure.
fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<sqlx::Error>()
        .and_then(sqlx::Error::as_database_error)
        .is_some_and(|db| db.is_unique_violation())
}

#[derive(Clone)]
pub struct AuthService {
    users: UserRepository,
    sessions: RefreshSessionStore,
    auth: AuthState,
}

impl AuthService {
    pub fn new(users: UserRepository, sessions: RefreshSessionStore, auth: AuthState) -> Self {
        Self {
            users,
            sessions,
            auth,
        }
    }

    fn issue_and_describe(&self, user: &User) -> Result<(Identity, TokenPair), AuthError> {
        let identity = Identity {
            id: user.id,
            email: user.email.clone(),
            role: user.role,
        };
        let pair = self.auth.issuer().issue(&identity)?;
        Ok((identity, pair))
    }

    /// Create an account and start a session.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn signup(
        &self,
        email: &str,
        password: &str,
        name: &str,
        role: Role,
    ) -> Result<TokenPair, AuthError> {
        if self.users.get_by_email(email).await?.is_some() {
            return Err(AuthError::DuplicateEmail);
        }

        let password_hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        // A concurrent signup can slip past the email check above; the
        // schema's UNIQUE constraint catches the loser.
        let user = match self
            .users
            .create(CreateUserRequest {
                email: email.to_string(),
                password_hash,
                name: name.to_string(),
                role,
            })
            .await
        {
            Ok(user) => user,
            Err(err) if is_unique_violation(&err) => return Err(AuthError::DuplicateEmail),
            Err(err) => return Err(err.into()),
        };

        let (_, pair) = self.issue_and_describe(&user)?;
        self.sessions.rotate(user.id, &pair.refresh_token).await?;

        info!(user_id = user.id, "user signed up");
        Ok(pair)
    }

    /// Verify credentials and start a session.
    ///
    /// Unknown email and wrong password both yield `InvalidCredentials`, so
    /// the response never reveals which one failed.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn signin(&self, email: &str, password: &str) -> Result<TokenPair, AuthError> {
        let user = self
            .users
            .get_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !bcrypt::verify(password, &user.password_hash).unwrap_or(false) {
            return Err(AuthError::InvalidCredentials);
        }

        let (_, pair) = self.issue_and_describe(&user)?;
        self.sessions.rotate(user.id, &pair.refresh_token).await?;

        info!(user_id = user.id, "user signed in");
        Ok(pair)
    }

    /// Exchange a refresh token for a new pair, rotating the session.
    ///
    /// The presented token must verify cryptographically and match the
    /// stored hash. On success the stored hash is rotated to the new
    /// refresh token, so the just-used token is permanently invalid even
    /// before its expiry. Two concurrent refreshes with the same token may
    /// both pass the hash check; the last rotation wins and the earlier
    /// caller's pair is superseded immediately.
    #[instrument(skip(self, presented_token))]
    pub async fn refresh(&self, presented_token: &str) -> Result<TokenPair, AuthError> {
        let identity = self.auth.issuer().verify_refresh(presented_token)?;

        if !self.sessions.verify(identity.id, presented_token).await? {
            return Err(AuthError::TokenMismatch);
        }

        let pair = self.auth.issuer().issue(&identity)?;
        self.sessions
            .rotate(identity.id, &pair.refresh_token)
            .await?;

        info!(user_id = identity.id, "refresh token rotated");
        Ok(pair)
    }

    /// End the session unconditionally.
    ///
    /// Any previously issued refresh token fails verification afterwards.
    #[instrument(skip(self))]
    pub async fn logout(&self, user_id: i64) -> Result<(), AuthError> {
        self.sessions.clear(user_id).await?;
        info!(user_id, "user logged out");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::config::{DEFAULT_ACCESS_TTL_SECS, DEFAULT_REFRESH_TTL_SECS};
    use crate::auth::tokens::TokenIssuer;
    use crate::db::Database;

    async fn test_service() -> AuthService {
        let db = Database::in_memory().await.unwrap();
        let issuer = TokenIssuer::new(
            "access-secret-for-unit-tests-minimum-32-chars",
            "refresh-secret-for-unit-tests-minimum-32-chars",
            DEFAULT_ACCESS_TTL_SECS,
            DEFAULT_REFRESH_TTL_SECS,
        );
        AuthService::new(
            UserRepository::new(db.pool().clone()),
            RefreshSessionStore::new(db.pool().clone()),
            AuthState::new(issuer),
        )
    }

    #[tokio::test]
    async fn test_signup_then_signin_round_trip() {
        let service = test_service().await;

        let signup_pair = service
            .signup("alice@x.edu", "pw123secret", "Alice", Role::Student)
            .await
            .unwrap();

        let signin_pair = service.signin("alice@x.edu", "pw123secret").await.unwrap();

        // Same identity in both pairs' claims.
        let from_signup = service
            .auth
            .issuer()
            .verify_access(&signup_pair.access_token)
            .unwrap();
        let from_signin = service
            .auth
            .issuer()
            .verify_access(&signin_pair.access_token)
            .unwrap();
        assert_eq!(from_signup, from_signin);
        assert_eq!(from_signin.email, "alice@x.edu");
        assert_eq!(from_signin.role, Role::Student);
    }

    #[tokio::test]
    async fn test_signup_duplicate_email() {
        let service = test_service().await;

        service
            .signup("alice@x.edu", "pw123secret", "Alice", Role::Student)
            .await
            .unwrap();

        let err = service
            .signup("alice@x.edu", "otherpassword", "Alice Again", Role::Student)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::DuplicateEmail));
    }

    #[tokio::test]
    async fn test_racing_duplicate_insert_detected_at_schema() {
        let service = test_service().await;

        service
            .signup("alice@x.edu", "pw123secret", "Alice", Role::Student)
            .await
            .unwrap();

        // The losing side of a concurrent signup slips past the email
        // pre-check and hits the schema's UNIQUE constraint instead.
        let err = service
            .users
            .create(CreateUserRequest {
                email: "alice@x.edu".to_string(),
                password_hash: "hashed".to_string(),
                name: "Alice Again".to_string(),
                role: Role::Student,
            })
            .await
            .unwrap_err();
        assert!(is_unique_violation(&err));
    }

    #[tokio::test]
    async fn test_signin_bad_credentials_collapse() {
        let service = test_service().await;

        service
            .signup("alice@x.edu", "pw123secret", "Alice", Role::Student)
            .await
            .unwrap();

        // Wrong password and unknown email produce the same error.
        let wrong_pw = service
            .signin("alice@x.edu", "wrongpassword")
            .await
            .unwrap_err();
        let unknown = service
            .signin("nobody@x.edu", "pw123secret")
            .await
            .unwrap_err();
        assert!(matches!(wrong_pw, AuthError::InvalidCredentials));
        assert!(matches!(unknown, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_refresh_rotates_and_invalidates_replay() {
        let service = test_service().await;

        let pair1 = service
            .signup("alice@x.edu", "pw123secret", "Alice", Role::Student)
            .await
            .unwrap();

        let pair2 = service.refresh(&pair1.refresh_token).await.unwrap();
        assert_ne!(pair1.refresh_token, pair2.refresh_token);

        // Replaying the rotated-out token fails with a mismatch, not a
        // signature error.
        let err = service.refresh(&pair1.refresh_token).await.unwrap_err();
        assert!(matches!(err, AuthError::TokenMismatch));

        // The new token still works.
        service.refresh(&pair2.refresh_token).await.unwrap();
    }

    #[tokio::test]
    async fn test_refresh_rejects_forged_token() {
        let service = test_service().await;

        service
            .signup("alice@x.edu", "pw123secret", "Alice", Role::Student)
            .await
            .unwrap();

        let err = service.refresh("not.a.token").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(_)));
    }

    #[tokio::test]
    async fn test_refresh_rejects_access_token() {
        let service = test_service().await;

        let pair = service
            .signup("alice@x.edu", "pw123secret", "Alice", Role::Student)
            .await
            .unwrap();

        // An access token is signed with the wrong secret for refresh.
        let err = service.refresh(&pair.access_token).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(_)));
    }

    #[tokio::test]
    async fn test_logout_invalidates_refresh() {
        let service = test_service().await;

        let pair = service
            .signup("alice@x.edu", "pw123secret", "Alice", Role::Student)
            .await
            .unwrap();

        let identity = service
            .auth
            .issuer()
            .verify_access(&pair.access_token)
            .unwrap();
        service.logout(identity.id).await.unwrap();

        // The refresh token is not expired, but the session is gone.
        let err = service.refresh(&pair.refresh_token).await.unwrap_err();
        assert!(matches!(err, AuthError::TokenMismatch));
    }

    #[tokio::test]
    async fn test_signin_supersedes_previous_session() {
        let service = test_service().await;

        let pair1 = service
            .signup("alice@x.edu", "pw123secret", "Alice", Role::Student)
            .await
            .unwrap();
        let pair2 = service.signin("alice@x.edu", "pw123secret").await.unwrap();

        // One active refresh token per account: the signup token is dead.
        let err = service.refresh(&pair1.refresh_token).await.unwrap_err();
        assert!(matches!(err, AuthError::TokenMismatch));
        service.refresh(&pair2.refresh_token).await.unwrap();
    }
}
