//! Outgoing mail over SMTP.
//!
//! Uses lettre for delivery with Askama templates for the bodies.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::EmailConfig;

/// HTML body of a name-tracking email.
#[derive(Template)]
#[template(path = "email/name_tracking.html")]
pub struct NameTrackingEmailHtml<'a> {
    pub recipient: &'a str,
    pub observer: &'a str,
    pub name: &'a str,
    pub observation_url: &'a str,
    pub note: Option<&'a str>,
}

/// Plain text body of a name-tracking email.
#[derive(Template)]
#[template(path = "email/name_tracking.txt")]
pub struct NameTrackingEmailText<'a> {
    pub recipient: &'a str,
    pub observer: &'a str,
    pub name: &'a str,
    pub observation_url: &'a str,
    pub note: Option<&'a str>,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Email service for transactional mail.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }

    /// Send a multipart email with both plain text and HTML versions.
    ///
    /// # Errors
    ///
    /// Returns error if an address is invalid or delivery fails.
    pub async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: String,
        html_body: String,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body),
                    ),
            )?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_name_tracking_bodies_render() {
        let text = NameTrackingEmailText {
            recipient: "mary",
            observer: "rolf",
            name: "Amanita muscaria",
            observation_url: "https://mycoflora.org/observations/7",
            note: Some("Please send me a sample"),
        }
        .render()
        .unwrap();
        assert!(text.contains("rolf"));
        assert!(text.contains("Amanita muscaria"));
        assert!(text.contains("/observations/7"));
        assert!(text.contains("Please send me a sample"));

        let html = NameTrackingEmailHtml {
            recipient: "mary",
            observer: "<rolf>",
            name: "Amanita muscaria",
            observation_url: "https://mycoflora.org/observations/7",
            note: None,
        }
        .render()
        .unwrap();
        assert!(html.contains("&lt;rolf&gt;") || html.contains("&#60;rolf&#62;"));
    }
}
