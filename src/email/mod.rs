//! # Email Notifications
//!
//! This module delivers batches of newly available accommodations to subscribers
//! over SMTP. One plain-text message is sent per batch, addressed from the configured
//! account to every recipient.
//!
//! ## Message Format
//!
//! ```text
//! Subject: New CROUS Accommodation Available
//!
//! New accommodations found:
//!
//! Name: Résidence Gaston Berger
//! Price: 259,9 €
//! Location: 13090 Aix-en-Provence
//! Surface: 18 m²
//! Link: https://trouverunlogement.lescrous.fr/tools/36/accommodations/2107
//!
//! Total Available: 1
//! ```
//!
//! Entries are ordered by id so repeated batches read the same way.
//!
//! ## Environment Configuration
//!
//! Set `GMAIL_USER`, `GMAIL_PASS` (an app password) and `EMAIL_RECIPIENTS`.
//! If they are not set, notifications are disabled and batches are only logged.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{info, warn};

use crate::config::EmailConfig;
use crate::error::DeliveryError;
use crate::models::{Accommodation, Catalog};
use crate::traits::Notifier;

pub const SUBJECT: &str = "New CROUS Accommodation Available";

/// Renders the plain-text body for a batch of accommodations.
pub fn render_body(novel: &Catalog) -> String {
    let mut entries: Vec<&Accommodation> = novel.values().collect();
    entries.sort_by(|a, b| a.id.cmp(&b.id));

    let lines: Vec<String> = entries
        .iter()
        .map(|a| {
            format!(
                "Name: {}\nPrice: {}\nLocation: {}\nSurface: {}\nLink: {}\n",
                a.name,
                a.price,
                a.location,
                a.surface_area.as_deref().unwrap_or("-"),
                a.link
            )
        })
        .collect();

    format!(
        "New accommodations found:\n\n{}\nTotal Available: {}",
        lines.join("\n"),
        novel.len()
    )
}

struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Vec<Mailbox>,
}

/// SMTP notification client for accommodation batches.
///
/// Works unconfigured: without an [`EmailConfig`] every batch is logged and reported
/// as delivered, so the watcher can run without credentials.
pub struct EmailNotifier {
    mailer: Option<Mailer>,
}

impl EmailNotifier {
    /// Creates a notifier, connecting lazily to the SMTP relay over STARTTLS.
    ///
    /// ## Errors
    ///
    /// Fails when an address does not parse or the relay host is invalid. Nothing is
    /// sent at construction time.
    pub fn new(config: Option<&EmailConfig>) -> Result<Self, DeliveryError> {
        let Some(config) = config else {
            warn!("Email credentials not set - email notifications will be disabled");
            return Ok(Self { mailer: None });
        };

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        let from: Mailbox = config.username.parse()?;
        let to = config
            .recipients
            .iter()
            .map(|r| r.parse::<Mailbox>())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            mailer: Some(Mailer {
                transport,
                from,
                to,
            }),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.mailer.is_some()
    }

    fn build_message(mailer: &Mailer, novel: &Catalog) -> Result<Message, DeliveryError> {
        let mut builder = Message::builder().from(mailer.from.clone()).subject(SUBJECT);
        for recipient in &mailer.to {
            builder = builder.to(recipient.clone());
        }

        Ok(builder
            .header(ContentType::TEXT_PLAIN)
            .body(render_body(novel))?)
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn notify(&self, novel: &Catalog) -> Result<(), DeliveryError> {
        let Some(mailer) = &self.mailer else {
            info!(
                "Email disabled, would have sent {} accommodations:\n{}",
                novel.len(),
                render_body(novel)
            );
            return Ok(());
        };

        let message = Self::build_message(mailer, novel)?;
        mailer.transport.send(message).await?;

        info!(
            "Email sent to {} recipients for {} accommodations",
            mailer.to.len(),
            novel.len()
        );
        Ok(())
    }
}
