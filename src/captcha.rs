use crate::config::CaptchaConfig;
use crate::{PilotError, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;
use std::time::Duration;

/// Client for a 2captcha-style image solving service: submit the payload,
/// wait a fixed interval, then poll for the textual solution.
///
/// This is an external collaborator, not part of the login flow: the result
/// is not wired back into authentication automatically, and manual solving
/// in the browser window remains the default path.
pub struct CaptchaSolver {
    api_key: String,
    endpoint: String,
    http: reqwest::Client,
    initial_wait: Duration,
    poll_interval: Duration,
    max_polls: u32,
}

#[derive(Debug, Deserialize)]
struct ServiceResponse {
    status: u32,
    request: String,
}

const NOT_READY: &str = "CAPCHA_NOT_READY";

impl CaptchaSolver {
    pub fn new(config: &CaptchaConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| PilotError::ConfigError("captcha.api_key is not set".into()))?;

        Ok(Self {
            api_key,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            initial_wait: Duration::from_secs(config.initial_wait_secs),
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            max_polls: config.max_polls,
        })
    }

    /// Submits an image payload and polls until the service returns its
    /// textual solution or the poll budget runs out.
    pub async fn solve_image(&self, image: &[u8]) -> Result<String> {
        let task_id = self.submit(image).await?;
        tracing::debug!(task_id = %task_id, "captcha submitted");

        tokio::time::sleep(self.initial_wait).await;

        for attempt in 1..=self.max_polls {
            let response: ServiceResponse = self
                .http
                .get(format!("{}/res.php", self.endpoint))
                .query(&[
                    ("key", self.api_key.as_str()),
                    ("action", "get"),
                    ("id", task_id.as_str()),
                    ("json", "1"),
                ])
                .send()
                .await?
                .json()
                .await?;

            if response.status == 1 {
                tracing::info!(attempts = attempt, "captcha solved");
                return Ok(response.request);
            }
            if response.request != NOT_READY {
                return Err(PilotError::CaptchaService(response.request));
            }

            tokio::time::sleep(self.poll_interval).await;
        }

        Err(PilotError::CaptchaService(format!(
            "no solution after {} polls",
            self.max_polls
        )))
    }

    async fn submit(&self, image: &[u8]) -> Result<String> {
        let body = BASE64.encode(image);

        let response: ServiceResponse = self
            .http
            .post(format!("{}/in.php", self.endpoint))
            .form(&[
                ("key", self.api_key.as_str()),
                ("method", "base64"),
                ("body", body.as_str()),
                ("json", "1"),
            ])
            .send()
            .await?
            .json()
            .await?;

        if response.status != 1 {
            return Err(PilotError::CaptchaService(response.request));
        }
        Ok(response.request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(endpoint: String) -> CaptchaConfig {
        CaptchaConfig {
            api_key: Some("test-key".into()),
            endpoint,
            initial_wait_secs: 0,
            poll_interval_secs: 0,
            max_polls: 3,
        }
    }

    #[test]
    fn test_new_requires_api_key() {
        let config = CaptchaConfig::default();
        assert!(matches!(
            CaptchaSolver::new(&config),
            Err(PilotError::ConfigError(_))
        ));
    }

    #[tokio::test]
    async fn test_solve_image_happy_path() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/in.php"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": 1,
                "request": "42"
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/res.php"))
            .and(query_param("id", "42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": 1,
                "request": "W7X2P"
            })))
            .mount(&server)
            .await;

        let solver = CaptchaSolver::new(&test_config(server.uri())).unwrap();
        let solution = solver.solve_image(b"fake-image-bytes").await.unwrap();
        assert_eq!(solution, "W7X2P");
    }

    #[tokio::test]
    async fn test_solve_image_submit_rejected() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/in.php"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": 0,
                "request": "ERROR_WRONG_USER_KEY"
            })))
            .mount(&server)
            .await;

        let solver = CaptchaSolver::new(&test_config(server.uri())).unwrap();
        match solver.solve_image(b"img").await {
            Err(PilotError::CaptchaService(msg)) => assert_eq!(msg, "ERROR_WRONG_USER_KEY"),
            other => panic!("expected CaptchaService error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_solve_image_gives_up_after_poll_budget() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/in.php"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": 1,
                "request": "42"
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/res.php"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": 0,
                "request": "CAPCHA_NOT_READY"
            })))
            .expect(3)
            .mount(&server)
            .await;

        let solver = CaptchaSolver::new(&test_config(server.uri())).unwrap();
        assert!(matches!(
            solver.solve_image(b"img").await,
            Err(PilotError::CaptchaService(_))
        ));
    }
}
