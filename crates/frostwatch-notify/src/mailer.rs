use frostwatch_core::EmailConfig;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials as SmtpCredentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::instrument;

use crate::compose::Notification;
use crate::error::NotifyError;

pub const SENDER_EMAIL_VAR: &str = "SENDER_EMAIL";
pub const SENDER_PASSWORD_VAR: &str = "SENDER_PASSWORD";
pub const RECIPIENT_EMAIL_VAR: &str = "RECIPIENT_EMAIL";

/// SMTP login and recipient, read from the environment.
#[derive(Clone)]
pub struct Credentials {
    pub sender: String,
    password: String,
    pub recipient: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("sender", &self.sender)
            .field("password", &"<redacted>")
            .field("recipient", &self.recipient)
            .finish()
    }
}

impl Credentials {
    pub fn new(sender: &str, password: &str, recipient: Option<&str>) -> Self {
        Self {
            sender: sender.to_string(),
            password: password.to_string(),
            recipient: recipient.unwrap_or(sender).to_string(),
        }
    }

    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// The recipient defaults to the sender. Returns `None` unless both
    /// sender and password are present and non-empty.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let sender = non_empty(SENDER_EMAIL_VAR)?;
        let password = non_empty(SENDER_PASSWORD_VAR)?;
        let recipient = non_empty(RECIPIENT_EMAIL_VAR);

        Some(Self::new(&sender, &password, recipient.as_deref()))
    }
}

/// What happened to a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Sent { recipient: String },
    /// Not mailed; the alerts were printed instead
    Printed { reason: String },
}

#[derive(Debug, Clone)]
pub struct Mailer {
    smtp_host: String,
    smtp_port: u16,
    credentials: Option<Credentials>,
}

impl Mailer {
    pub fn new(config: &EmailConfig, credentials: Option<Credentials>) -> Self {
        Self {
            smtp_host: config.smtp_host.clone(),
            smtp_port: config.smtp_port,
            credentials,
        }
    }

    /// Send the notification, falling back to stdout on any failure.
    pub async fn deliver(&self, notification: &Notification) -> Delivery {
        let Some(credentials) = &self.credentials else {
            println!(
                "Email credentials not configured. Set {} and {} environment variables.",
                SENDER_EMAIL_VAR, SENDER_PASSWORD_VAR
            );
            if !notification.alerts.is_empty() {
                println!("Alerts that would have been sent:");
                println!("{}", notification.alerts_as_text());
            }
            return Delivery::Printed {
                reason: "credentials not configured".to_string(),
            };
        };

        match self.send(credentials, notification).await {
            Ok(()) => {
                println!("Email sent successfully to {}", credentials.recipient);
                for alert in &notification.alerts {
                    println!("- {}", alert.label());
                }
                Delivery::Sent {
                    recipient: credentials.recipient.clone(),
                }
            }
            Err(e) => {
                tracing::error!(transient = e.is_transient(), "Error sending email: {}", e);
                println!("Error sending email: {}", e);
                if !notification.alerts.is_empty() {
                    println!("\nAlerts that failed to send:");
                    println!("{}", notification.alerts_as_text());
                }
                Delivery::Printed {
                    reason: e.to_string(),
                }
            }
        }
    }

    #[instrument(skip(self, credentials, notification), fields(host = %self.smtp_host), level = "info")]
    async fn send(
        &self,
        credentials: &Credentials,
        notification: &Notification,
    ) -> Result<(), NotifyError> {
        let message = build_message(credentials, notification)?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.smtp_host)?
            .port(self.smtp_port)
            .credentials(SmtpCredentials::new(
                credentials.sender.clone(),
                credentials.password.clone(),
            ))
            .build();

        transport.send(message).await?;
        Ok(())
    }
}

fn build_message(credentials: &Credentials, notification: &Notification) -> Result<Message, NotifyError> {
    let from: Mailbox = credentials.sender.parse()?;
    let to: Mailbox = credentials.recipient.parse()?;

    let message = Message::builder()
        .from(from)
        .to(to)
        .subject(notification.subject.clone())
        .header(ContentType::TEXT_PLAIN)
        .body(notification.body.clone())?;

    Ok(message)
}
