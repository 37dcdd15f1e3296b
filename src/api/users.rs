// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

use super::ApiClient;
use crate::error::ApiResult;
use crate::types::{User, UserPayload};

impl ApiClient {
    pub async fn list_users(&self) -> ApiResult<Vec<User>> {
        self.get(&["users"]).await
    }

    pub async fn get_user(&self, id: i64) -> ApiResult<User> {
        self.get(&["users", &id.to_string()]).await
    }

    pub async fn create_user(&self, payload: &UserPayload) -> ApiResult<Option<User>> {
        let created: Option<User> = self.post(&["users"], payload).await?;
        tracing::info!(
            "USER_CREATED | name={} role={}",
            payload.name,
            payload.role.unwrap_or_default().as_str()
        );
        Ok(created)
    }

    pub async fn update_user(&self, id: i64, payload: &UserPayload) -> ApiResult<Option<User>> {
        let updated: Option<User> = self.put(&["users", &id.to_string()], payload).await?;
        tracing::info!(
            "USER_UPDATED | id={} name={} password_changed={}",
            id,
            payload.name,
            payload.password.is_some()
        );
        Ok(updated)
    }

    pub async fn delete_user(&self, id: i64) -> ApiResult<()> {
        self.delete::<()>(&["users", &id.to_string()]).await?;
        tracing::info!("USER_DELETED | id={}", id);
        Ok(())
    }
}
