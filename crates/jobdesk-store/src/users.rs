//! User repository.

use tracing::info;

use jobdesk_models::{NewUser, User, UserId};

use crate::client::StoreClient;
use crate::error::{StoreError, StoreResult};

/// Repository for user accounts.
pub struct UserRepository {
    client: StoreClient,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    /// Create a user. Email uniqueness is checked and the record inserted
    /// under one writer lock.
    pub async fn create(&self, payload: NewUser) -> StoreResult<User> {
        let mut state = self.client.state.write().await;

        if state.emails.contains_key(&payload.email) {
            return Err(StoreError::already_exists(format!(
                "user with email {}",
                payload.email
            )));
        }

        let user = User::new(payload);
        state.emails.insert(user.email.clone(), user.id.clone());
        state.users.insert(user.id.clone(), user.clone());

        info!(user_id = %user.id, role = %user.role, "Created user");
        Ok(user)
    }

    /// Get a user by ID.
    pub async fn get(&self, id: &UserId) -> StoreResult<Option<User>> {
        let state = self.client.state.read().await;
        Ok(state.users.get(id).cloned())
    }

    /// Look a user up by email.
    pub async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let state = self.client.state.read().await;
        let user = state
            .emails
            .get(email)
            .and_then(|id| state.users.get(id))
            .cloned();
        Ok(user)
    }
}
