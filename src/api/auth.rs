// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

use serde::{Deserialize, Serialize};

use super::ApiClient;
use crate::error::{ApiError, ApiResult, GENERIC_ERROR};
use crate::session::Credentials;
use crate::types::User;
use crate::utils::mask_sensitive;

/// User name used for `/users/by-name/` when nobody is stored.
const ANONYMOUS_USER: &str = "anonymous";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest<'a> {
    user_name: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
}

impl ApiClient {
    /// `POST /auth/login`. On success the token and user name are written to
    /// the credential store.
    pub async fn login(&self, user_name: &str, password: &str) -> ApiResult<Credentials> {
        let response: LoginResponse = self
            .post(&["auth", "login"], &LoginRequest { user_name, password })
            .await?;
        if response.token.is_empty() {
            return Err(ApiError::Decode("login response has an empty token".to_string()));
        }

        let credentials = Credentials::new(response.token, Some(user_name.to_string()));
        self.store()
            .save(&credentials)
            .map_err(|e| ApiError::Storage(e.to_string()))?;
        tracing::info!(
            "LOGIN_SUCCESS | user={} token={}",
            user_name,
            mask_sensitive(&credentials.token, 6)
        );
        Ok(credentials)
    }

    /// Drop the stored credentials. Never fails.
    pub fn logout(&self) {
        let user = self.store().user_name();
        self.store().clear();
        tracing::info!("LOGOUT | user={}", user.as_deref().unwrap_or(ANONYMOUS_USER));
    }

    /// `GET /users/by-name/{name}` for the stored user name.
    pub async fn current_user(&self) -> ApiResult<User> {
        let name = self.store().user_name().unwrap_or_else(|| ANONYMOUS_USER.to_string());
        self.get(&["users", "by-name", &name]).await
    }
}

/// Message shown when a login attempt fails: the backend's message if it sent
/// one, otherwise the transport error, otherwise a generic text.
pub fn login_error_message(err: &ApiError) -> String {
    match err {
        ApiError::Status { message: Some(m), .. } => m.clone(),
        ApiError::Unauthorized => "Invalid user name or password".to_string(),
        ApiError::Network(e) => e.clone(),
        _ => GENERIC_ERROR.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_request_wire_names() {
        let body = serde_json::to_value(LoginRequest { user_name: "ana", password: "x" }).unwrap();
        assert_eq!(body, serde_json::json!({ "userName": "ana", "password": "x" }));
    }

    #[test]
    fn test_login_error_message() {
        let backend = ApiError::Status { status: 400, message: Some("Usuario bloqueado".into()) };
        assert_eq!(login_error_message(&backend), "Usuario bloqueado");
        assert_eq!(
            login_error_message(&ApiError::Network("connection refused".into())),
            "connection refused"
        );
        assert_eq!(
            login_error_message(&ApiError::Status { status: 500, message: None }),
            GENERIC_ERROR
        );
    }
}
