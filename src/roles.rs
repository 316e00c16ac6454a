//! Admin and moderator role sets.
//!
//! Admins manage both sets: adding or removing an admin or a moderator
//! requires the caller to already be an admin. An admin may remove itself,
//! which can empty the admin set; the bootstrap files are the recovery path.
//! Bootstrap ingestion (`bootstrap_admin` / `bootstrap_moderator`) bypasses
//! authorization and is only reachable from startup code.

use std::collections::BTreeSet;

use crate::identity::Identity;

/// Role mutation failures.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RoleError {
    /// The caller is not an admin.
    #[error("caller {0} is not an admin")]
    NotAllowed(Identity),
}

/// Sets of admins and moderators with admin-guarded mutations.
#[derive(Debug, Default)]
pub struct RoleStore {
    admins: BTreeSet<Identity>,
    moderators: BTreeSet<Identity>,
}

impl RoleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_admin(&self, user: &Identity) -> bool {
        self.admins.contains(user)
    }

    pub fn is_moderator(&self, user: &Identity) -> bool {
        self.moderators.contains(user)
    }

    pub fn list_admins(&self) -> Vec<Identity> {
        self.admins.iter().cloned().collect()
    }

    pub fn list_moderators(&self) -> Vec<Identity> {
        self.moderators.iter().cloned().collect()
    }

    pub fn add_admin(&mut self, caller: &Identity, user: &Identity) -> Result<(), RoleError> {
        self.authorize(caller)?;
        self.admins.insert(user.clone());
        Ok(())
    }

    pub fn remove_admin(&mut self, caller: &Identity, user: &Identity) -> Result<(), RoleError> {
        self.authorize(caller)?;
        self.admins.remove(user);
        Ok(())
    }

    pub fn add_moderator(&mut self, caller: &Identity, user: &Identity) -> Result<(), RoleError> {
        self.authorize(caller)?;
        self.moderators.insert(user.clone());
        Ok(())
    }

    pub fn remove_moderator(&mut self, caller: &Identity, user: &Identity) -> Result<(), RoleError> {
        self.authorize(caller)?;
        self.moderators.remove(user);
        Ok(())
    }

    /// Inserts an admin without authorization. Startup ingestion only.
    pub fn bootstrap_admin(&mut self, user: Identity) {
        self.admins.insert(user);
    }

    /// Inserts a moderator without authorization. Startup ingestion only.
    pub fn bootstrap_moderator(&mut self, user: Identity) {
        self.moderators.insert(user);
    }

    fn authorize(&self, caller: &Identity) -> Result<(), RoleError> {
        if self.is_admin(caller) {
            Ok(())
        } else {
            Err(RoleError::NotAllowed(caller.clone()))
        }
    }
}
