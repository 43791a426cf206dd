//! Ephemeral session identity.

use std::sync::{PoisonError, RwLock};

/// The signed-in user for this process. Not persisted.
#[derive(Debug, Default)]
pub struct Session {
    user_id: RwLock<Option<String>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_id(&self) -> Option<String> {
        self.user_id
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id().is_some()
    }

    /// Blank ids are stored as "no user".
    pub fn set_user_id(&self, user_id: impl Into<String>) {
        let user_id = user_id.into();
        let value = (!user_id.trim().is_empty()).then_some(user_id);
        *self.user_id.write().unwrap_or_else(PoisonError::into_inner) = value;
    }

    pub fn clear(&self) {
        *self.user_id.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}
