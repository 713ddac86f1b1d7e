//! HTTP adapters for the transactional mail providers.

use serde_json::json;

use crate::config::{AutomationConfig, MailerProvider};
use crate::domain::repository::MailerPort;
use crate::error::AutomationServiceError;

const SENDGRID_API: &str = "https://api.sendgrid.com";
const POSTMARK_API: &str = "https://api.postmarkapp.com";

/// A mailer backed by one of the supported providers, chosen by config.
#[derive(Clone)]
pub enum HttpMailer {
    Sendgrid(SendgridMailer),
    Postmark(PostmarkMailer),
}

impl HttpMailer {
    pub fn from_config(config: &AutomationConfig) -> Self {
        let client = reqwest::Client::new();
        match config.mailer_provider {
            MailerProvider::Sendgrid => Self::Sendgrid(SendgridMailer {
                client,
                base_url: config
                    .mailer_base_url
                    .clone()
                    .unwrap_or_else(|| SENDGRID_API.to_owned()),
                api_key: config.mailer_api_key.clone(),
                from: config.mailer_from.clone(),
            }),
            MailerProvider::Postmark => Self::Postmark(PostmarkMailer {
                client,
                base_url: config
                    .mailer_base_url
                    .clone()
                    .unwrap_or_else(|| POSTMARK_API.to_owned()),
                server_token: config.mailer_api_key.clone(),
                from: config.mailer_from.clone(),
            }),
        }
    }
}

impl MailerPort for HttpMailer {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        template_id: &str,
    ) -> Result<(), AutomationServiceError> {
        match self {
            Self::Sendgrid(mailer) => mailer.send(to, subject, template_id).await,
            Self::Postmark(mailer) => mailer.send(to, subject, template_id).await,
        }
    }
}

// ── SendGrid ─────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct SendgridMailer {
    pub client: reqwest::Client,
    pub base_url: String,
    pub api_key: String,
    pub from: String,
}

impl MailerPort for SendgridMailer {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        template_id: &str,
    ) -> Result<(), AutomationServiceError> {
        let body = json!({
            "personalizations": [{
                "to": [{ "email": to }],
                "subject": subject,
            }],
            "from": { "email": self.from },
            "template_id": template_id,
        });
        let response = self
            .client
            .post(format!("{}/v3/mail/send", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AutomationServiceError::MailerFailure(e.to_string()))?;
        check_status("sendgrid", response)
    }
}

// ── Postmark ─────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct PostmarkMailer {
    pub client: reqwest::Client,
    pub base_url: String,
    pub server_token: String,
    pub from: String,
}

impl MailerPort for PostmarkMailer {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        template_id: &str,
    ) -> Result<(), AutomationServiceError> {
        let body = json!({
            "From": self.from,
            "To": to,
            "TemplateAlias": template_id,
            "TemplateModel": { "subject": subject },
        });
        let response = self
            .client
            .post(format!("{}/email/withTemplate", self.base_url))
            .header("X-Postmark-Server-Token", &self.server_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| AutomationServiceError::MailerFailure(e.to_string()))?;
        check_status("postmark", response)
    }
}

fn check_status(
    provider: &str,
    response: reqwest::Response,
) -> Result<(), AutomationServiceError> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(AutomationServiceError::MailerFailure(format!(
            "{provider} responded {status}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexflow_testing::mailer::MockMailServer;

    fn sendgrid(base_url: String) -> SendgridMailer {
        SendgridMailer {
            client: reqwest::Client::new(),
            base_url,
            api_key: "sg-key".into(),
            from: "hello@example-firm.com".into(),
        }
    }

    #[tokio::test]
    async fn should_post_sendgrid_payload_with_bearer_auth() {
        let server = MockMailServer::spawn().await;
        let mailer = sendgrid(server.base_url());

        mailer
            .send("client@example.com", "Welcome", "welcome_1")
            .await
            .unwrap();

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].path, "/v3/mail/send");
        assert_eq!(requests[0].authorization.as_deref(), Some("Bearer sg-key"));
        assert_eq!(requests[0].body["template_id"], "welcome_1");
        assert_eq!(
            requests[0].body["personalizations"][0]["to"][0]["email"],
            "client@example.com"
        );
    }

    #[tokio::test]
    async fn should_post_postmark_payload_with_server_token() {
        let server = MockMailServer::spawn().await;
        let mailer = PostmarkMailer {
            client: reqwest::Client::new(),
            base_url: server.base_url(),
            server_token: "pm-token".into(),
            from: "hello@example-firm.com".into(),
        };

        mailer
            .send("client@example.com", "Welcome", "welcome_1")
            .await
            .unwrap();

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].path, "/email/withTemplate");
        assert_eq!(requests[0].authorization.as_deref(), Some("pm-token"));
        assert_eq!(requests[0].body["TemplateAlias"], "welcome_1");
        assert_eq!(requests[0].body["To"], "client@example.com");
    }

    #[tokio::test]
    async fn should_surface_provider_error_status() {
        let server = MockMailServer::spawn().await;
        server.set_response_status(500);
        let mailer = sendgrid(server.base_url());

        let result = mailer.send("client@example.com", "Welcome", "welcome_1").await;

        assert!(matches!(
            result,
            Err(AutomationServiceError::MailerFailure(_))
        ));
    }
}
