//! HTTP settings service adapter

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use crate::application::ports::{
    SettingsAck, SettingsError, SettingsSync, StudioSettings, UserProfile,
};

#[derive(Debug, Deserialize)]
struct AuthResponse {
    status: u16,
    #[serde(default)]
    user: Option<UserProfile>,
}

/// Persists studio settings and loads user profiles from the web service
pub struct HttpSettingsSync {
    client: reqwest::Client,
    base: String,
}

impl HttpSettingsSync {
    pub fn new(settings_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base: settings_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }
}

#[async_trait]
impl SettingsSync for HttpSettingsSync {
    async fn update(
        &self,
        studio_id: &str,
        settings: &StudioSettings,
    ) -> Result<SettingsAck, SettingsError> {
        let url = format!("{}/studio/{}", self.base, studio_id);
        let response = self
            .client
            .post(&url)
            .json(settings)
            .send()
            .await
            .map_err(|e| SettingsError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SettingsError::Rejected(status.as_u16()));
        }

        let ack: SettingsAck = response
            .json()
            .await
            .map_err(|e| SettingsError::InvalidResponse(e.to_string()))?;
        debug!(studio_id, status = ack.status, message = %ack.message, "settings saved");
        Ok(ack)
    }

    async fn load(&self, user_id: &str) -> Result<UserProfile, SettingsError> {
        let url = format!("{}/auth/{}", self.base, user_id);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SettingsError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(SettingsError::NotFound(user_id.to_string()));
        }
        if !status.is_success() {
            return Err(SettingsError::Rejected(status.as_u16()));
        }

        let body: AuthResponse = response
            .json()
            .await
            .map_err(|e| SettingsError::InvalidResponse(e.to_string()))?;

        match body.user {
            Some(user) if body.status < 400 => Ok(user),
            _ => Err(SettingsError::NotFound(user_id.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::profile::{Plan, Preset};
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn update_posts_settings() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/studio/s1"))
            .and(body_json(json!({
                "screen": "screen:0:0",
                "audio": "default",
                "preset": "HD",
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({
                    "status": 200,
                    "message": "Settings updated",
                })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let sync = HttpSettingsSync::new(format!("{}/api/", server.uri()));
        let ack = sync
            .update(
                "s1",
                &StudioSettings {
                    screen: "screen:0:0".to_string(),
                    audio: "default".to_string(),
                    preset: Preset::Hd,
                },
            )
            .await
            .unwrap();
        assert_eq!(ack.status, 200);
        assert_eq!(ack.message, "Settings updated");
    }

    #[tokio::test]
    async fn update_failure_is_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let sync = HttpSettingsSync::new(server.uri());
        let err = sync
            .update(
                "s1",
                &StudioSettings {
                    screen: "a".to_string(),
                    audio: "b".to_string(),
                    preset: Preset::Sd,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SettingsError::Rejected(500)));
    }

    #[tokio::test]
    async fn load_reads_plan_and_studio() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/u1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": 200,
                "user": {
                    "id": "u1",
                    "subscription": { "plan": "PRO" },
                    "studio": { "screen": "screen:1:0", "mic": "default", "preset": "HD" },
                },
            })))
            .mount(&server)
            .await;

        let user = HttpSettingsSync::new(server.uri()).load("u1").await.unwrap();
        assert_eq!(user.plan(), Some(Plan::Pro));
        let studio = user.studio.unwrap();
        assert_eq!(studio.screen.as_deref(), Some("screen:1:0"));
        assert_eq!(studio.preset, Some(Preset::Hd));
    }

    #[tokio::test]
    async fn missing_user_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/ghost"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": 404,
            })))
            .mount(&server)
            .await;

        let err = HttpSettingsSync::new(server.uri())
            .load("ghost")
            .await
            .unwrap_err();
        assert!(matches!(err, SettingsError::NotFound(_)));
    }
}
