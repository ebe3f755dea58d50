//! # Access gate
//!
//! Every access decision flows through [`AccessGate`]. It owns the login
//! rate limiter and talks to the share store; callers hand it raw
//! credentials (an optional user id, an optional public token, a session)
//! and get back either the share or a typed refusal.
//!
//! Three entry points:
//!
//! - [`AccessGate::authorize_share`]: the full pipeline guarding share
//!   content and mutations
//! - [`AccessGate::view_share_login`]: the weaker check guarding the
//!   password entry screen
//! - [`AccessGate::share_login`]: a password attempt, throttled per share
//!   and client address
//!
//! The gate never trusts a caller's claim about their permission level; it
//! re-resolves from the stored share every time.

use uuid::Uuid;

use crate::share::Share;
use crate::share_store::ShareStore;

use super::error::{AccessError, DenyReason};
use super::permission::Requirement;
use super::rate_limit::{login_throttle_key, LoginRateLimiter, ThrottleConfig};
use super::session::{share_password_key, SessionStore};

#[derive(Debug)]
pub struct AccessGate<S: ShareStore> {
    store: S,
    limiter: LoginRateLimiter,
}

impl<S: ShareStore> AccessGate<S> {
    pub fn new(store: S) -> Self {
        Self::with_throttle(store, ThrottleConfig::default())
    }

    pub fn with_throttle(store: S, throttle: ThrottleConfig) -> Self {
        Self {
            store,
            limiter: LoginRateLimiter::new(throttle),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn limiter(&self) -> &LoginRateLimiter {
        &self.limiter
    }

    /// Authorize a request against a share and return the share on success.
    ///
    /// The pipeline, in order:
    ///
    /// 1. If a token is presented, the share is looked up among
    ///    token-bearing shares and the token compared in constant time.
    ///    Otherwise the lookup is filtered to what `user` can reach, and a
    ///    caller with no credentials at all gets [`AccessError::NotFound`].
    /// 2. The password gate runs unless skipped or the caller is the
    ///    owner: the session must hold the share's current hash.
    /// 3. A valid token satisfies a `read` requirement by itself. Every
    ///    other requirement is resolved from ownership and grants.
    ///
    /// `skip_password_check` exists for surfaces that must see the share
    /// while the password is still outstanding (the login screen itself).
    pub async fn authorize_share(
        &self,
        session: &dyn SessionStore,
        share_id: Uuid,
        public_token: Option<&str>,
        user: Option<Uuid>,
        required: Requirement,
        skip_password_check: bool,
    ) -> Result<Share, AccessError<S::Error>> {
        let share = match public_token {
            Some(token) => {
                let share = self
                    .store
                    .public_share(share_id)
                    .await?
                    .ok_or(AccessError::NotFound)?;
                match share.public_token() {
                    Some(current) if current.matches(token) => share,
                    _ => {
                        tracing::warn!(share_id = %share_id, "public token mismatch");
                        return Err(AccessError::denied(
                            DenyReason::PublicTokenIncorrect,
                            "public token does not match",
                        ));
                    }
                }
            }
            None => {
                // no identity and no token reads the same as no share
                let Some(user) = user else {
                    return Err(AccessError::NotFound);
                };
                self.store
                    .share_accessible_to(share_id, user)
                    .await?
                    .ok_or(AccessError::NotFound)?
            }
        };

        let is_owner = user.map(|u| share.is_owner(u)).unwrap_or(false);

        if !skip_password_check && !is_owner {
            if let Some(password) = share.password() {
                let elevated = session
                    .get(&share_password_key(share.id()))
                    .map(|stored| password.ct_eq(&stored))
                    .unwrap_or(false);
                if !elevated {
                    tracing::warn!(share_id = %share.id(), "share password not elevated");
                    return Err(AccessError::denied(
                        DenyReason::InvalidSharePassword,
                        "share password required",
                    ));
                }
            }
        }

        // a valid token is read access in its own right
        if public_token.is_some() && required == Requirement::Read {
            return Ok(share);
        }

        if !share.allows(user, required) {
            tracing::warn!(
                share_id = %share.id(),
                required = %required,
                "permission missing"
            );
            return Err(AccessError::denied(
                DenyReason::MissingPermission,
                format!("requires {} permission", required),
            ));
        }

        Ok(share)
    }

    /// Authorize viewing the password entry screen for a share.
    ///
    /// Weaker than [`AccessGate::authorize_share`]: the visitor has not
    /// entered the password yet, so the gate only establishes that they
    /// are allowed to try. Any identity-reachable share qualifies, as
    /// does a correct public token. With nothing to go on the refusal is
    /// [`DenyReason::MissingCredentials`].
    pub async fn view_share_login(
        &self,
        share_id: Uuid,
        public_token: Option<&str>,
        user: Option<Uuid>,
    ) -> Result<Share, AccessError<S::Error>> {
        if let Some(user) = user {
            if let Some(share) = self.store.share_accessible_to(share_id, user).await? {
                return Ok(share);
            }
        }

        if let Some(token) = public_token {
            let share = self
                .store
                .public_share(share_id)
                .await?
                .ok_or(AccessError::NotFound)?;
            return match share.public_token() {
                Some(current) if current.matches(token) => Ok(share),
                _ => {
                    tracing::warn!(share_id = %share_id, "public token mismatch at login screen");
                    Err(AccessError::denied(
                        DenyReason::PublicTokenIncorrect,
                        "public token does not match",
                    ))
                }
            };
        }

        Err(AccessError::denied(
            DenyReason::MissingCredentials,
            "no credentials presented",
        ))
    }

    /// Attempt the share password and, on success, elevate the session.
    ///
    /// The throttle is consulted before the password: a throttled caller
    /// learns nothing about the password, correct or not, and the check
    /// itself does not consume an attempt. Failed attempts are counted
    /// per `<share_id>|<client_ip>`. A share without a password rejects
    /// every attempt.
    ///
    /// On success the session stores the share's current hash string.
    /// Nothing is stored on failure, and the counter is left to expire on
    /// its own.
    pub async fn share_login(
        &self,
        session: &dyn SessionStore,
        share_id: Uuid,
        password: &str,
        client_ip: &str,
    ) -> Result<Share, AccessError<S::Error>> {
        let share = self
            .store
            .share(share_id)
            .await?
            .ok_or(AccessError::NotFound)?;

        let key = login_throttle_key(share.id(), client_ip);
        if self.limiter.too_many_attempts(&key) {
            let available_in = self.limiter.available_in(&key);
            tracing::warn!(
                share_id = %share.id(),
                client_ip = %client_ip,
                "login attempts throttled"
            );
            return Err(AccessError::RateLimited { available_in });
        }

        let Some(hash) = share.password() else {
            let attempts = self.limiter.hit(&key);
            tracing::warn!(
                share_id = %share.id(),
                client_ip = %client_ip,
                attempts,
                "login attempt against passwordless share"
            );
            return Err(AccessError::denied(
                DenyReason::InvalidSharePassword,
                "share password incorrect",
            ));
        };

        if !hash.verify(password) {
            let attempts = self.limiter.hit(&key);
            tracing::warn!(
                share_id = %share.id(),
                client_ip = %client_ip,
                attempts,
                "share password rejected"
            );
            return Err(AccessError::denied(
                DenyReason::InvalidSharePassword,
                "share password incorrect",
            ));
        }

        session.set(&share_password_key(share.id()), hash.as_str().to_string());
        tracing::debug!(share_id = %share.id(), "share password accepted");

        Ok(share)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::access::{GrantLevel, MemorySession};
    use crate::crypto::PasswordHash;
    use crate::share::{AuditEntry, AuditKind};
    use crate::share_store::MemoryShareStore;

    const IP: &str = "10.1.2.3";

    fn new_share(owner: Uuid) -> Share {
        Share::new(owner, "briefs".to_string(), "design briefs".to_string())
    }

    async fn seed(share: &Share) -> AccessGate<MemoryShareStore> {
        let store = MemoryShareStore::new();
        store
            .insert_share(
                share,
                AuditEntry::new(share.id(), AuditKind::ShareCreate, Some(share.owner_id())),
            )
            .await
            .unwrap();
        AccessGate::new(store)
    }

    async fn save(gate: &AccessGate<MemoryShareStore>, share: &Share) {
        gate.store()
            .update_share(
                share,
                AuditEntry::new(share.id(), AuditKind::ShareUpdate, Some(share.owner_id())),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_owner_passes_every_requirement() {
        let owner = Uuid::new_v4();
        let share = new_share(owner);
        let gate = seed(&share).await;
        let session = MemorySession::new();

        for required in [Requirement::Read, Requirement::Write, Requirement::Owner] {
            let got = gate
                .authorize_share(&session, share.id(), None, Some(owner), required, false)
                .await
                .unwrap();
            assert_eq!(got.id(), share.id());
        }
    }

    #[tokio::test]
    async fn test_grant_levels_resolve_through_gate() {
        let owner = Uuid::new_v4();
        let reader = Uuid::new_v4();
        let writer = Uuid::new_v4();
        let mut share = new_share(owner);
        share.grant(reader, GrantLevel::Read);
        share.grant(writer, GrantLevel::Write);
        let gate = seed(&share).await;
        let session = MemorySession::new();

        // reader: read yes, write no
        gate.authorize_share(&session, share.id(), None, Some(reader), Requirement::Read, false)
            .await
            .unwrap();
        let err = gate
            .authorize_share(&session, share.id(), None, Some(reader), Requirement::Write, false)
            .await
            .unwrap_err();
        assert_eq!(err.deny_reason(), Some(DenyReason::MissingPermission));

        // writer: write yes, owner no
        gate.authorize_share(&session, share.id(), None, Some(writer), Requirement::Write, false)
            .await
            .unwrap();
        let err = gate
            .authorize_share(&session, share.id(), None, Some(writer), Requirement::Owner, false)
            .await
            .unwrap_err();
        assert_eq!(err.deny_reason(), Some(DenyReason::MissingPermission));
    }

    #[tokio::test]
    async fn test_not_found_conflates_missing_and_inaccessible() {
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let share = new_share(owner);
        let gate = seed(&share).await;
        let session = MemorySession::new();

        let inaccessible = gate
            .authorize_share(&session, share.id(), None, Some(stranger), Requirement::Read, false)
            .await
            .unwrap_err();
        let missing = gate
            .authorize_share(
                &session,
                Uuid::new_v4(),
                None,
                Some(stranger),
                Requirement::Read,
                false,
            )
            .await
            .unwrap_err();

        assert!(matches!(inaccessible, AccessError::NotFound));
        assert!(matches!(missing, AccessError::NotFound));
    }

    #[tokio::test]
    async fn test_no_credentials_reads_as_not_found() {
        let share = new_share(Uuid::new_v4());
        let gate = seed(&share).await;
        let session = MemorySession::new();

        let err = gate
            .authorize_share(&session, share.id(), None, None, Requirement::Read, false)
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::NotFound));
    }

    #[tokio::test]
    async fn test_token_grants_anonymous_read() {
        let mut share = new_share(Uuid::new_v4());
        let token = share.enable_public_link().clone();
        let gate = seed(&share).await;
        let session = MemorySession::new();

        let got = gate
            .authorize_share(
                &session,
                share.id(),
                Some(token.as_str()),
                None,
                Requirement::Read,
                false,
            )
            .await
            .unwrap();
        assert_eq!(got.id(), share.id());
    }

    #[tokio::test]
    async fn test_token_must_match_byte_for_byte() {
        let mut share = new_share(Uuid::new_v4());
        let token = share.enable_public_link().clone();
        let gate = seed(&share).await;
        let session = MemorySession::new();

        let truncated = &token.as_str()[..token.as_str().len() - 1];
        for candidate in [truncated, "definitely-wrong", ""] {
            let err = gate
                .authorize_share(
                    &session,
                    share.id(),
                    Some(candidate),
                    None,
                    Requirement::Read,
                    false,
                )
                .await
                .unwrap_err();
            assert_eq!(err.deny_reason(), Some(DenyReason::PublicTokenIncorrect));
        }
    }

    #[tokio::test]
    async fn test_token_against_private_share_is_not_found() {
        let share = new_share(Uuid::new_v4());
        let gate = seed(&share).await;
        let session = MemorySession::new();

        let err = gate
            .authorize_share(
                &session,
                share.id(),
                Some("any-token"),
                None,
                Requirement::Read,
                false,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::NotFound));
    }

    #[tokio::test]
    async fn test_token_does_not_satisfy_write() {
        let mut share = new_share(Uuid::new_v4());
        let token = share.enable_public_link().clone();
        let gate = seed(&share).await;
        let session = MemorySession::new();

        let err = gate
            .authorize_share(
                &session,
                share.id(),
                Some(token.as_str()),
                None,
                Requirement::Write,
                false,
            )
            .await
            .unwrap_err();
        assert_eq!(err.deny_reason(), Some(DenyReason::MissingPermission));
    }

    #[tokio::test]
    async fn test_token_plus_grant_can_write() {
        let owner = Uuid::new_v4();
        let writer = Uuid::new_v4();
        let mut share = new_share(owner);
        share.grant(writer, GrantLevel::Write);
        let token = share.enable_public_link().clone();
        let gate = seed(&share).await;
        let session = MemorySession::new();

        // the token finds the share, the grant satisfies the requirement
        gate.authorize_share(
            &session,
            share.id(),
            Some(token.as_str()),
            Some(writer),
            Requirement::Write,
            false,
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_password_gate_blocks_until_login() {
        let owner = Uuid::new_v4();
        let reader = Uuid::new_v4();
        let mut share = new_share(owner);
        share.grant(reader, GrantLevel::Read);
        share.set_password(Some(PasswordHash::new("swordfish").unwrap()));
        let gate = seed(&share).await;
        let session = MemorySession::new();

        let err = gate
            .authorize_share(&session, share.id(), None, Some(reader), Requirement::Read, false)
            .await
            .unwrap_err();
        assert_eq!(err.deny_reason(), Some(DenyReason::InvalidSharePassword));

        gate.share_login(&session, share.id(), "swordfish", IP)
            .await
            .unwrap();

        gate.authorize_share(&session, share.id(), None, Some(reader), Requirement::Read, false)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_owner_bypasses_password_gate() {
        let owner = Uuid::new_v4();
        let mut share = new_share(owner);
        share.set_password(Some(PasswordHash::new("swordfish").unwrap()));
        let gate = seed(&share).await;
        let session = MemorySession::new();

        gate.authorize_share(&session, share.id(), None, Some(owner), Requirement::Read, false)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_skip_password_check_bypasses_gate_only() {
        let owner = Uuid::new_v4();
        let reader = Uuid::new_v4();
        let mut share = new_share(owner);
        share.grant(reader, GrantLevel::Read);
        share.set_password(Some(PasswordHash::new("swordfish").unwrap()));
        let gate = seed(&share).await;
        let session = MemorySession::new();

        // password skipped, but the permission check still runs
        gate.authorize_share(&session, share.id(), None, Some(reader), Requirement::Read, true)
            .await
            .unwrap();
        let err = gate
            .authorize_share(&session, share.id(), None, Some(reader), Requirement::Write, true)
            .await
            .unwrap_err();
        assert_eq!(err.deny_reason(), Some(DenyReason::MissingPermission));
    }

    #[tokio::test]
    async fn test_token_visitor_still_faces_password_gate() {
        let mut share = new_share(Uuid::new_v4());
        let token = share.enable_public_link().clone();
        share.set_password(Some(PasswordHash::new("swordfish").unwrap()));
        let gate = seed(&share).await;
        let session = MemorySession::new();

        let err = gate
            .authorize_share(
                &session,
                share.id(),
                Some(token.as_str()),
                None,
                Requirement::Read,
                false,
            )
            .await
            .unwrap_err();
        assert_eq!(err.deny_reason(), Some(DenyReason::InvalidSharePassword));

        gate.share_login(&session, share.id(), "swordfish", IP)
            .await
            .unwrap();

        gate.authorize_share(
            &session,
            share.id(),
            Some(token.as_str()),
            None,
            Requirement::Read,
            false,
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_password_rotation_invalidates_elevation() {
        let owner = Uuid::new_v4();
        let reader = Uuid::new_v4();
        let mut share = new_share(owner);
        share.grant(reader, GrantLevel::Read);
        share.set_password(Some(PasswordHash::new("first").unwrap()));
        let gate = seed(&share).await;
        let session = MemorySession::new();

        gate.share_login(&session, share.id(), "first", IP).await.unwrap();
        gate.authorize_share(&session, share.id(), None, Some(reader), Requirement::Read, false)
            .await
            .unwrap();

        // rotate the password; the session still holds the old hash
        share.set_password(Some(PasswordHash::new("second").unwrap()));
        save(&gate, &share).await;

        let err = gate
            .authorize_share(&session, share.id(), None, Some(reader), Requirement::Read, false)
            .await
            .unwrap_err();
        assert_eq!(err.deny_reason(), Some(DenyReason::InvalidSharePassword));

        // logging in with the new password restores access
        gate.share_login(&session, share.id(), "second", IP).await.unwrap();
        gate.authorize_share(&session, share.id(), None, Some(reader), Requirement::Read, false)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_sixth_attempt_is_throttled_even_with_correct_password() {
        let mut share = new_share(Uuid::new_v4());
        share.set_password(Some(PasswordHash::new("right").unwrap()));
        let gate = seed(&share).await;
        let session = MemorySession::new();

        for _ in 0..5 {
            let err = gate
                .share_login(&session, share.id(), "wrong", IP)
                .await
                .unwrap_err();
            assert_eq!(err.deny_reason(), Some(DenyReason::InvalidSharePassword));
        }

        let err = gate
            .share_login(&session, share.id(), "right", IP)
            .await
            .unwrap_err();
        match err {
            AccessError::RateLimited { available_in } => {
                assert!(available_in > std::time::Duration::ZERO)
            }
            other => panic!("expected RateLimited, got {:?}", other),
        }

        // the session was never elevated
        assert!(session.get(&share_password_key(share.id())).is_none());
    }

    #[tokio::test]
    async fn test_throttle_is_per_client() {
        let mut share = new_share(Uuid::new_v4());
        share.set_password(Some(PasswordHash::new("right").unwrap()));
        let gate = seed(&share).await;
        let session = MemorySession::new();

        for _ in 0..5 {
            let _ = gate.share_login(&session, share.id(), "wrong", IP).await;
        }
        assert!(matches!(
            gate.share_login(&session, share.id(), "right", IP).await,
            Err(AccessError::RateLimited { .. })
        ));

        // a different client address is unaffected
        gate.share_login(&session, share.id(), "right", "10.9.9.9")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_passwordless_share_rejects_login() {
        let share = new_share(Uuid::new_v4());
        let gate = seed(&share).await;
        let session = MemorySession::new();

        let err = gate
            .share_login(&session, share.id(), "anything", IP)
            .await
            .unwrap_err();
        assert_eq!(err.deny_reason(), Some(DenyReason::InvalidSharePassword));
        // the attempt was consumed
        let key = login_throttle_key(share.id(), IP);
        assert_eq!(gate.limiter().hit(&key), 2);
    }

    #[tokio::test]
    async fn test_view_share_login_paths() {
        let owner = Uuid::new_v4();
        let reader = Uuid::new_v4();
        let outsider = Uuid::new_v4();
        let mut share = new_share(owner);
        share.grant(reader, GrantLevel::Read);
        share.set_password(Some(PasswordHash::new("swordfish").unwrap()));
        let token = share.enable_public_link().clone();
        let gate = seed(&share).await;

        // identity path, password not yet entered
        gate.view_share_login(share.id(), None, Some(reader)).await.unwrap();
        gate.view_share_login(share.id(), None, Some(owner)).await.unwrap();

        // token path
        gate.view_share_login(share.id(), Some(token.as_str()), None)
            .await
            .unwrap();
        let err = gate
            .view_share_login(share.id(), Some("wrong"), None)
            .await
            .unwrap_err();
        assert_eq!(err.deny_reason(), Some(DenyReason::PublicTokenIncorrect));

        // nothing to go on
        let err = gate.view_share_login(share.id(), None, None).await.unwrap_err();
        assert_eq!(err.deny_reason(), Some(DenyReason::MissingCredentials));
        let err = gate
            .view_share_login(share.id(), None, Some(outsider))
            .await
            .unwrap_err();
        assert_eq!(err.deny_reason(), Some(DenyReason::MissingCredentials));
    }

    #[tokio::test]
    async fn test_deleted_share_is_gone_for_everyone() {
        let owner = Uuid::new_v4();
        let mut share = new_share(owner);
        let token = share.enable_public_link().clone();
        let gate = seed(&share).await;
        let session = MemorySession::new();

        gate.store()
            .delete_share(
                share.id(),
                AuditEntry::new(share.id(), AuditKind::ShareDelete, Some(owner)),
            )
            .await
            .unwrap();

        let err = gate
            .authorize_share(&session, share.id(), None, Some(owner), Requirement::Read, false)
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::NotFound));

        let err = gate
            .authorize_share(
                &session,
                share.id(),
                Some(token.as_str()),
                None,
                Requirement::Read,
                false,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::NotFound));

        let err = gate
            .share_login(&session, share.id(), "any", IP)
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::NotFound));
    }
}
