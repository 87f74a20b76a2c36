//! Report delivery by email.
//!
//! `ReportMailer` is the seam: `SmtpMailer` speaks SMTP over implicit TLS,
//! tests substitute a recording mock.

use std::io::Write;
use std::path::Path;

use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, Message, SmtpTransport, Transport};
use thiserror::Error;

use crate::config::SmtpConfig;

pub const DEFAULT_SUBJECT: &str = "SCADA Well Report";
pub const DEFAULT_BODY: &str = "Please find the attached SCADA report PDF.";
pub const ATTACHMENT_NAME: &str = "Well_Report.pdf";

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("Invalid recipient address: {0:?}")]
    InvalidRecipient(String),

    #[error("Email delivery is not configured")]
    NotConfigured,

    #[error("Attachment I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not build message: {0}")]
    Message(String),

    #[error("SMTP transport failed: {0}")]
    Transport(String),
}

pub trait ReportMailer: Send + Sync {
    /// Send `attachment_path` as a PDF attachment to `to`.
    fn send_report(
        &self,
        to: &Address,
        subject: &str,
        body: &str,
        attachment_path: &Path,
    ) -> Result<(), DeliveryError>;
}

/// Parse and validate a recipient address.
pub fn parse_recipient(raw: &str) -> Result<Address, DeliveryError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DeliveryError::InvalidRecipient(String::new()));
    }
    trimmed
        .parse::<Address>()
        .map_err(|_| DeliveryError::InvalidRecipient(trimmed.to_string()))
}

/// Write `pdf` to a temporary file, hand it to `mailer` with the default
/// subject and body, and remove the file again.
pub fn deliver_report(
    mailer: &dyn ReportMailer,
    recipient: &str,
    pdf: &[u8],
) -> Result<Address, DeliveryError> {
    let to = parse_recipient(recipient)?;

    let mut file = tempfile::Builder::new()
        .prefix("scada-report-")
        .suffix(".pdf")
        .tempfile()?;
    file.write_all(pdf)?;
    file.flush()?;

    mailer.send_report(&to, DEFAULT_SUBJECT, DEFAULT_BODY, file.path())?;
    tracing::info!(bytes = pdf.len(), "Report emailed");
    Ok(to)
}

pub struct SmtpMailer {
    sender: Mailbox,
    transport: SmtpTransport,
}

impl SmtpMailer {
    /// Build a mailer from configuration. Fails with `NotConfigured` when
    /// no credentials were supplied.
    pub fn new(config: &SmtpConfig) -> Result<Self, DeliveryError> {
        let (address, password) = config
            .credentials
            .as_ref()
            .ok_or(DeliveryError::NotConfigured)?;

        let sender = address
            .parse::<Mailbox>()
            .map_err(|e| DeliveryError::Message(format!("sender address: {e}")))?;
        let transport = SmtpTransport::relay(&config.host)
            .map_err(|e| DeliveryError::Transport(e.to_string()))?
            .port(config.port)
            .credentials(Credentials::new(address.clone(), password.clone()))
            .build();

        Ok(Self { sender, transport })
    }
}

impl ReportMailer for SmtpMailer {
    fn send_report(
        &self,
        to: &Address,
        subject: &str,
        body: &str,
        attachment_path: &Path,
    ) -> Result<(), DeliveryError> {
        let bytes = std::fs::read(attachment_path)?;
        let pdf_type = ContentType::parse("application/pdf")
            .map_err(|e| DeliveryError::Message(e.to_string()))?;

        let message = Message::builder()
            .from(self.sender.clone())
            .to(Mailbox::new(None, to.clone()))
            .subject(subject)
            .multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::plain(body.to_string()))
                    .singlepart(Attachment::new(ATTACHMENT_NAME.to_string()).body(bytes, pdf_type)),
            )
            .map_err(|e| DeliveryError::Message(e.to_string()))?;

        self.transport
            .send(&message)
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;
        Ok(())
    }
}
