//! Account endpoints: login, registration, profile management.

use crate::http::{Auth, HttpApi, decode};
use async_trait::async_trait;
use lyra_core::error::{LyraError, Result};
use lyra_core::services::{AccountService, EmailAvailability, ProfileUpdate, RegisterRequest};
use lyra_core::user::UserProfile;
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[allow(dead_code)]
    #[serde(default)]
    token_type: String,
}

#[derive(Serialize)]
struct EmailCheckRequest<'a> {
    email: &'a str,
}

#[async_trait]
impl AccountService for HttpApi {
    async fn login(&self, email: &str, password: &str) -> Result<String> {
        // OAuth2 password flow: form-encoded, email goes in `username`
        let body = self
            .post_form(
                "/auth/login",
                &[("username", email), ("password", password)],
                Auth::Optional,
            )
            .await?;
        let token: TokenResponse = decode(body)?;
        Ok(token.access_token)
    }

    async fn current_user(&self) -> Result<UserProfile> {
        let body = self.get_json("/auth/me", Auth::Required).await?;
        decode(body)
    }

    async fn register(&self, request: &RegisterRequest) -> Result<UserProfile> {
        let body = self
            .post_json("/auth/register", request, Auth::Optional)
            .await?;
        decode(body)
    }

    async fn check_email(&self, email: &str) -> Result<EmailAvailability> {
        let body = self
            .post_json("/auth/check-email", &EmailCheckRequest { email }, Auth::Optional)
            .await?;
        decode(body)
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserProfile> {
        let mut form = reqwest::multipart::Form::new();

        let text_fields = [
            ("full_name", &update.full_name),
            ("nickname", &update.nickname),
            ("email", &update.email),
            ("birth_date", &update.birth_date),
        ];
        for (name, value) in text_fields {
            if let Some(value) = value {
                form = form.text(name, value.clone());
            }
        }

        if let Some(interests) = &update.interests {
            // The backend stores interests as a JSON-encoded list
            form = form.text("interests", serde_json::to_string(interests)?);
        }

        if let Some(path) = &update.image {
            let bytes = tokio::fs::read(path).await.map_err(|err| {
                LyraError::storage(format!("Failed to read image {}: {}", path.display(), err))
            })?;
            let file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "avatar".to_string());
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            let part = reqwest::multipart::Part::bytes(bytes)
                .file_name(file_name)
                .mime_str(mime.essence_str())
                .map_err(|err| LyraError::internal(format!("Invalid image MIME type: {err}")))?;
            form = form.part("profile_image", part);
        }

        let body = self
            .put_multipart("/auth/update-profile", form, Auth::Required)
            .await?;
        decode(body)
    }

    async fn delete_account(&self) -> Result<()> {
        self.delete("/auth/delete-account", Auth::Required).await?;
        Ok(())
    }
}
