//! SMTP mail delivery.

use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};

use domain::models::settings::MailSettingForm;
use domain::models::{ConfigSnapshot, SnapshotExt};

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Mail transport is not configured")]
    NotConfigured,

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Failed to build message: {0}")]
    Build(String),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// Mail settings as read from the `crowi` namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpSettings {
    pub from: String,
    pub host: String,
    pub port: u16,
    pub credentials: Option<(String, String)>,
}

impl SmtpSettings {
    pub fn from_form(form: &MailSettingForm) -> Self {
        Self {
            from: form.from.clone(),
            host: form.smtp_host.clone(),
            port: form.smtp_port,
            credentials: form
                .credentials()
                .map(|(user, password)| (user.to_string(), password.to_string())),
        }
    }

    /// `None` unless sender, host and port are all configured.
    pub fn from_snapshot(config: &ConfigSnapshot) -> Option<Self> {
        let from = config.non_empty_str("mail:from")?;
        let host = config.non_empty_str("mail:smtpHost")?;
        let port = match config.get("mail:smtpPort") {
            Some(serde_json::Value::Number(n)) => n.as_u64(),
            Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        }
        .and_then(|p| u16::try_from(p).ok())
        .filter(|p| *p > 0)?;

        let credentials = match (
            config.non_empty_str("mail:smtpUser"),
            config.non_empty_str("mail:smtpPassword"),
        ) {
            (Some(user), Some(password)) => Some((user.to_string(), password.to_string())),
            _ => None,
        };

        Some(Self {
            from: from.to_string(),
            host: host.to_string(),
            port,
            credentials,
        })
    }

    fn build_transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, MailError> {
        let builder = if self.port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&self.host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.host)?
        };
        let builder = builder.port(self.port);
        let builder = match &self.credentials {
            Some((user, password)) => {
                builder.credentials(Credentials::new(user.clone(), password.clone()))
            }
            None => builder,
        };
        Ok(builder.build())
    }
}

struct ActiveTransport {
    settings: SmtpSettings,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

pub struct Mailer {
    active: RwLock<Option<ActiveTransport>>,
}

impl Default for Mailer {
    fn default() -> Self {
        Self::new()
    }
}

impl Mailer {
    pub fn new() -> Self {
        Self {
            active: RwLock::new(None),
        }
    }

    pub async fn is_configured(&self) -> bool {
        self.active.read().await.is_some()
    }

    /// Rebuilds the transport from the `crowi` namespace.
    pub async fn reinitialize(&self, config: &ConfigSnapshot) {
        let active = match SmtpSettings::from_snapshot(config) {
            Some(settings) => match settings.build_transport() {
                Ok(transport) => {
                    info!(
                        host = %settings.host,
                        port = settings.port,
                        "Mail transport initialized"
                    );
                    Some(ActiveTransport {
                        settings,
                        transport,
                    })
                }
                Err(e) => {
                    warn!(error = %e, "Failed to initialize mail transport");
                    None
                }
            },
            None => None,
        };
        *self.active.write().await = active;
    }

    /// Sends a plain-text mail through the configured transport.
    pub async fn send(&self, to: &str, subject: &str, body: String) -> Result<(), MailError> {
        let active = self.active.read().await;
        let active = active.as_ref().ok_or(MailError::NotConfigured)?;
        let message = build_message(&active.settings.from, to, subject, body)?;
        active.transport.send(message).await?;
        info!(to = %to, subject = %subject, "Mail sent");
        Ok(())
    }

    /// Sends a test mail using not-yet-saved settings.
    pub async fn send_test(&self, form: &MailSettingForm, to: &str) -> Result<(), MailError> {
        let settings = SmtpSettings::from_form(form);
        let transport = settings.build_transport()?;
        let message = build_message(
            &settings.from,
            to,
            "Wiki mail setting test",
            "This is a test mail sent to verify the SMTP settings of the wiki.\n\
             If you received it, the mail settings are working."
                .to_string(),
        )?;
        transport.send(message).await?;
        info!(to = %to, host = %settings.host, "Test mail sent");
        Ok(())
    }
}

fn build_message(from: &str, to: &str, subject: &str, body: String) -> Result<Message, MailError> {
    Message::builder()
        .from(
            from.parse()
                .map_err(|_| MailError::InvalidAddress(from.to_string()))?,
        )
        .to(to
            .parse()
            .map_err(|_| MailError::InvalidAddress(to.to_string()))?)
        .subject(subject)
        .header(ContentType::TEXT_PLAIN)
        .body(body)
        .map_err(|e| MailError::Build(e.to_string()))
}

/// Body of the invitation mail sent to a new user.
pub fn invitation_body(app_title: &str, site_url: &str, email: &str, password: &str) -> String {
    format!(
        "You have been invited to {title}.\n\n\
         Sign in at {url} with the following credentials:\n\n\
         Email: {email}\n\
         Password: {password}\n\n\
         Please change your password after signing in.",
        title = app_title,
        url = site_url,
        email = email,
        password = password,
    )
}
