//! Notification e-mail
//!
//! ```text
//! handler ─ MailQueue::enqueue() → bounded mpsc → MailWorker → Mailer
//! ```
//!
//! Requests never wait on mail: a full queue rejects the new message and
//! logs it. The worker runs until every `MailQueue` is dropped, sending
//! whatever is still queued before it stops.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use minijinja::HtmlEscape;
use serde::{Deserialize, Serialize};
use shared::models::Reservation;
use shared::util::format_date;
use thiserror::Error;
use tokio::sync::mpsc;

/// Placeholder replaced by the message body in e-mail templates
pub const BODY_PLACEHOLDER: &str = "[%body%]";

/// One outgoing message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailData {
    pub to: String,
    pub from: String,
    pub subject: String,
    pub content: String,
    /// E-mail template file wrapping `content`
    pub template: Option<String>,
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail queue is full")]
    QueueFull,
    #[error("mail queue is closed")]
    QueueClosed,
    #[error("reading e-mail template {path}: {source}")]
    Template {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("mail transport failed: {0}")]
    Transport(String),
}

/// Delivers a fully composed message
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: &MailData, body: &str) -> Result<(), MailError>;
}

/// Transport that records messages in the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: &MailData, body: &str) -> Result<(), MailError> {
        tracing::info!(
            to = %mail.to,
            from = %mail.from,
            subject = %mail.subject,
            bytes = body.len(),
            "Email sent"
        );
        Ok(())
    }
}

/// Producer side of the mail queue
#[derive(Debug, Clone)]
pub struct MailQueue {
    tx: mpsc::Sender<MailData>,
}

impl MailQueue {
    /// Queue holding at most `capacity` unsent messages
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<MailData>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// Hand a message to the worker without waiting
    pub fn enqueue(&self, mail: MailData) -> Result<(), MailError> {
        match self.tx.try_send(mail) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(mail)) => {
                tracing::warn!(to = %mail.to, subject = %mail.subject, "Mail queue full, message dropped");
                Err(MailError::QueueFull)
            }
            Err(mpsc::error::TrySendError::Closed(mail)) => {
                tracing::warn!(to = %mail.to, subject = %mail.subject, "Mail queue closed, message dropped");
                Err(MailError::QueueClosed)
            }
        }
    }
}

/// Consumer side of the mail queue
pub struct MailWorker {
    mailer: Arc<dyn Mailer>,
    template_dir: PathBuf,
}

impl MailWorker {
    pub fn new(mailer: Arc<dyn Mailer>, template_dir: impl Into<PathBuf>) -> Self {
        Self {
            mailer,
            template_dir: template_dir.into(),
        }
    }

    /// Deliver messages until the queue closes; returns how many were sent
    pub async fn run(self, mut rx: mpsc::Receiver<MailData>) -> usize {
        tracing::info!("Mail worker started");
        let mut sent = 0;
        while let Some(mail) = rx.recv().await {
            match self.deliver(&mail).await {
                Ok(()) => sent += 1,
                Err(e) => tracing::warn!(to = %mail.to, error = %e, "Failed to send email"),
            }
        }
        tracing::info!(sent, "Mail worker stopped");
        sent
    }

    async fn deliver(&self, mail: &MailData) -> Result<(), MailError> {
        let body = self.compose(mail).await?;
        self.mailer.send(mail, &body).await
    }

    /// Wrap the content in its template, if it names one
    async fn compose(&self, mail: &MailData) -> Result<String, MailError> {
        let Some(name) = mail.template.as_deref() else {
            return Ok(mail.content.clone());
        };
        let path = self.template_dir.join(name);
        let template = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| MailError::Template { path, source })?;
        Ok(template.replace(BODY_PLACEHOLDER, &mail.content))
    }
}

/// Confirmation sent to the guest after a booking
pub fn guest_confirmation(reservation: &Reservation, from: &str) -> MailData {
    let content = format!(
        "<strong>Reservation Confirmation</strong><br>\
         Dear {},<br>\
         This is to confirm your reservation from {} to {}.",
        HtmlEscape(&reservation.first_name),
        format_date(reservation.start_date),
        format_date(reservation.end_date),
    );
    MailData {
        to: reservation.email.clone(),
        from: from.to_string(),
        subject: "Reservation Confirmation".to_string(),
        content,
        template: Some("basic.html".to_string()),
    }
}

/// Notice sent to the property owner after a booking
pub fn owner_notice(reservation: &Reservation, from: &str, owner: &str) -> MailData {
    let content = format!(
        "<strong>Reservation Notification</strong><br>\
         A reservation has been made for {} from {} to {}.",
        HtmlEscape(&reservation.room.room_name),
        format_date(reservation.start_date),
        format_date(reservation.end_date),
    );
    MailData {
        to: owner.to_string(),
        from: from.to_string(),
        subject: "Reservation Notification".to_string(),
        content,
        template: None,
    }
}
