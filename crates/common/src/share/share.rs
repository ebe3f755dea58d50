//! # Share
//!
//! The share is the root record of the system. It holds:
//!
//! - **Identity**: UUID, owner, name, and description
//! - **Access control**: optional public token, optional password hash, and
//!   the map of per-user grants
//! - **Lifecycle**: created/updated timestamps and a soft-deletion marker
//!
//! ## Credential paths
//!
//! Three independent paths can reach a share, resolved in this order:
//!
//! - **Ownership**: the owner always resolves to [`Permission::Owner`],
//!   regardless of the grants map
//! - **Grants**: a named user holds at most one grant at `read` or `write`
//! - **Public token**: anyone presenting the current token gets read access
//!
//! The owner never appears in the grants map; mutators silently drop owner
//! rows so a stale grant can never shadow ownership.
//!
//! ## Public link lifecycle
//!
//! Disabling the public link clears the token. Re-enabling generates a
//! fresh one, so previously circulated links never come back to life.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::access::{GrantLevel, Permission, Requirement};
use crate::crypto::{PasswordHash, PublicToken};

/// Map of user ids to their grant level.
pub type Grants = BTreeMap<Uuid, GrantLevel>;

/// A shared collection of files with its access-control state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Share {
    /// Global unique identifier for this share.
    id: Uuid,
    /// The user who created the share and holds full control.
    owner_id: Uuid,
    /// Human-readable name for display.
    name: String,
    /// Free-form description shown alongside the name.
    description: String,
    /// Capability token for anonymous read access. `Some` iff the share is
    /// publicly accessible.
    public_token: Option<PublicToken>,
    /// Password gate. `Some` iff visitors must re-enter a password.
    password: Option<PasswordHash>,
    /// Per-user grants. Never contains the owner.
    grants: Grants,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
    /// Soft-deletion marker. A deleted share is invisible to lookups but
    /// its audit history remains.
    deleted_at: Option<OffsetDateTime>,
}

impl Share {
    /// Create a new share owned by `owner_id`, with no token, no password,
    /// and no grants.
    pub fn new(owner_id: Uuid, name: String, description: String) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            name,
            description,
            public_token: None,
            password: None,
            grants: BTreeMap::new(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Rebuild a share from stored state. For store implementations and
    /// test fixtures; application code goes through [`Share::new`].
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: Uuid,
        owner_id: Uuid,
        name: String,
        description: String,
        public_token: Option<PublicToken>,
        password: Option<PasswordHash>,
        grants: Grants,
        created_at: OffsetDateTime,
        updated_at: OffsetDateTime,
        deleted_at: Option<OffsetDateTime>,
    ) -> Self {
        let mut share = Self {
            id,
            owner_id,
            name,
            description,
            public_token,
            password,
            grants,
            created_at,
            updated_at,
            deleted_at,
        };
        // a stored owner row must never shadow ownership
        share.grants.remove(&share.owner_id);
        share
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn owner_id(&self) -> Uuid {
        self.owner_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn public_token(&self) -> Option<&PublicToken> {
        self.public_token.as_ref()
    }

    pub fn password(&self) -> Option<&PasswordHash> {
        self.password.as_ref()
    }

    pub fn grants(&self) -> &Grants {
        &self.grants
    }

    pub fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    pub fn updated_at(&self) -> OffsetDateTime {
        self.updated_at
    }

    pub fn deleted_at(&self) -> Option<OffsetDateTime> {
        self.deleted_at
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Whether anonymous visitors can reach this share with a token.
    pub fn is_public(&self) -> bool {
        self.public_token.is_some()
    }

    pub fn has_password(&self) -> bool {
        self.password.is_some()
    }

    pub fn is_owner(&self, user: Uuid) -> bool {
        self.owner_id == user
    }

    /// Whether `user` can reach this share at all through identity
    /// (ownership or a grant). Token access is a separate path.
    pub fn is_accessible_by(&self, user: Uuid) -> bool {
        self.is_owner(user) || self.grants.contains_key(&user)
    }

    /// Resolve the permission level for an optional user.
    ///
    /// Anonymous callers resolve to `None`. The owner resolves to `Owner`
    /// without consulting the grants map, so no grant row can lower (or
    /// raise) what ownership already implies.
    pub fn permission_for(&self, user: Option<Uuid>) -> Permission {
        let Some(user) = user else {
            return Permission::None;
        };
        if self.is_owner(user) {
            return Permission::Owner;
        }
        self.grants
            .get(&user)
            .map(GrantLevel::permission)
            .unwrap_or(Permission::None)
    }

    /// Whether `user` satisfies `required` on this share.
    pub fn allows(&self, user: Option<Uuid>, required: Requirement) -> bool {
        self.permission_for(user).satisfies(required)
    }

    /// Update the display name.
    pub fn set_name(&mut self, name: String) {
        self.name = name;
        self.touch();
    }

    /// Update the description.
    pub fn set_description(&mut self, description: String) {
        self.description = description;
        self.touch();
    }

    /// Enable the public link, generating a fresh token if none is set.
    ///
    /// Returns the active token. If the link was already enabled the
    /// existing token is kept, so repeated saves do not rotate it.
    pub fn enable_public_link(&mut self) -> &PublicToken {
        if self.public_token.is_none() {
            self.touch();
        }
        self.public_token.get_or_insert_with(PublicToken::generate)
    }

    /// Disable the public link and discard the token.
    pub fn disable_public_link(&mut self) {
        if self.public_token.take().is_some() {
            self.touch();
        }
    }

    /// Set or clear the password gate. Rotating the hash invalidates every
    /// session elevation stored against the previous one.
    pub fn set_password(&mut self, password: Option<PasswordHash>) {
        self.password = password;
        self.touch();
    }

    /// Grant `user` access at `level`, replacing any existing grant.
    ///
    /// Granting to the owner is a no-op and returns false; ownership
    /// already implies everything a grant could add.
    pub fn grant(&mut self, user: Uuid, level: GrantLevel) -> bool {
        if self.is_owner(user) {
            return false;
        }
        self.grants.insert(user, level);
        self.touch();
        true
    }

    /// Remove a user's grant, returning the level they held.
    pub fn revoke(&mut self, user: Uuid) -> Option<GrantLevel> {
        let removed = self.grants.remove(&user);
        if removed.is_some() {
            self.touch();
        }
        removed
    }

    /// Replace the whole grant set. Owner entries in the input are dropped.
    pub fn replace_grants(&mut self, grants: impl IntoIterator<Item = (Uuid, GrantLevel)>) {
        self.grants = grants
            .into_iter()
            .filter(|(user, _)| !self.is_owner(*user))
            .collect();
        self.touch();
    }

    /// Mark the share deleted. Lookups hide it from then on; audit entries
    /// recorded against it remain readable.
    pub fn mark_deleted(&mut self) {
        if self.deleted_at.is_none() {
            self.deleted_at = Some(OffsetDateTime::now_utc());
        }
    }

    fn touch(&mut self) {
        self.updated_at = OffsetDateTime::now_utc();
    }
}
