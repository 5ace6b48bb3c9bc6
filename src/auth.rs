//! Caller authorization: owners, admins, everyone else.
//!
//! Owners come from configuration and never change at runtime. Admins are
//! seeded from configuration but can be granted and revoked while the bot
//! runs; only owners may do either.

use std::collections::HashSet;

use tokio::sync::RwLock;

use crate::config::AuthConfig;
use crate::error::{Error, Result};
use crate::types::RequesterId;

/// Privilege tier of a caller, ordered from least to most privileged
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Role {
    /// Any caller not listed anywhere
    Everyone,
    /// May run operator commands (cancel-all, status)
    Admin,
    /// Every admin privilege plus admin management
    Owner,
}

/// Who may do what, seeded from [`AuthConfig`]
pub struct AuthRegistry {
    owners: HashSet<u64>,
    admins: RwLock<HashSet<u64>>,
}

impl AuthRegistry {
    /// Build the registry from configuration
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            owners: config.owner_ids.clone(),
            admins: RwLock::new(config.admin_ids.clone()),
        }
    }

    /// The caller's privilege tier
    pub async fn role_of(&self, caller: RequesterId) -> Role {
        if self.owners.contains(&caller.0) {
            Role::Owner
        } else if self.admins.read().await.contains(&caller.0) {
            Role::Admin
        } else {
            Role::Everyone
        }
    }

    /// Whether the caller may run operator commands (owners included)
    pub async fn is_operator(&self, caller: RequesterId) -> bool {
        self.role_of(caller).await >= Role::Admin
    }

    /// Whether the caller is a configured owner
    pub fn is_owner(&self, caller: RequesterId) -> bool {
        self.owners.contains(&caller.0)
    }

    /// Grant admin to `target`. Owner-only; returns whether the set changed.
    pub async fn grant_admin(&self, caller: RequesterId, target: RequesterId) -> Result<bool> {
        if !self.is_owner(caller) {
            return Err(Error::Unauthorized(
                "only an owner may grant admin".to_string(),
            ));
        }
        let changed = self.admins.write().await.insert(target.0);
        if changed {
            tracing::info!(caller = caller.0, target = target.0, "admin granted");
        }
        Ok(changed)
    }

    /// Revoke admin from `target`. Owner-only; returns whether the set
    /// changed. Owners cannot be revoked; their role does not live in the
    /// admin set.
    pub async fn revoke_admin(&self, caller: RequesterId, target: RequesterId) -> Result<bool> {
        if !self.is_owner(caller) {
            return Err(Error::Unauthorized(
                "only an owner may revoke admin".to_string(),
            ));
        }
        let changed = self.admins.write().await.remove(&target.0);
        if changed {
            tracing::info!(caller = caller.0, target = target.0, "admin revoked");
        }
        Ok(changed)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: RequesterId = RequesterId(1);
    const ADMIN: RequesterId = RequesterId(2);
    const USER: RequesterId = RequesterId(3);

    fn registry() -> AuthRegistry {
        AuthRegistry::new(&AuthConfig {
            owner_ids: HashSet::from([OWNER.0]),
            admin_ids: HashSet::from([ADMIN.0]),
        })
    }

    #[tokio::test]
    async fn roles_reflect_the_seeded_sets() {
        let registry = registry();
        assert_eq!(registry.role_of(OWNER).await, Role::Owner);
        assert_eq!(registry.role_of(ADMIN).await, Role::Admin);
        assert_eq!(registry.role_of(USER).await, Role::Everyone);
    }

    #[tokio::test]
    async fn owners_count_as_operators() {
        let registry = registry();
        assert!(registry.is_operator(OWNER).await);
        assert!(registry.is_operator(ADMIN).await);
        assert!(!registry.is_operator(USER).await);
    }

    #[tokio::test]
    async fn owners_can_grant_and_revoke_admin() {
        let registry = registry();

        assert!(registry.grant_admin(OWNER, USER).await.unwrap());
        assert_eq!(registry.role_of(USER).await, Role::Admin);

        // granting again changes nothing
        assert!(!registry.grant_admin(OWNER, USER).await.unwrap());

        assert!(registry.revoke_admin(OWNER, USER).await.unwrap());
        assert_eq!(registry.role_of(USER).await, Role::Everyone);
    }

    #[tokio::test]
    async fn non_owners_may_not_manage_admins() {
        let registry = registry();

        let denied = registry.grant_admin(ADMIN, USER).await;
        assert!(matches!(denied, Err(Error::Unauthorized(_))));

        let denied = registry.revoke_admin(USER, ADMIN).await;
        assert!(matches!(denied, Err(Error::Unauthorized(_))));
        assert_eq!(registry.role_of(ADMIN).await, Role::Admin);
    }

    #[tokio::test]
    async fn revoking_an_owner_does_not_demote_them() {
        let registry = registry();
        assert!(!registry.revoke_admin(OWNER, OWNER).await.unwrap());
        assert_eq!(registry.role_of(OWNER).await, Role::Owner);
    }
}
