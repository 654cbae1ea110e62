use serde::Serialize;
use tracing::{info, warn};

use super::DeliveryError;
use crate::workflows::screening::batch::{BatchFailure, BatchReport};
use crate::workflows::screening::domain::{format_score, RecruiterReadyRecord};
use crate::workflows::screening::source::InviteError;

pub const DEFAULT_SUBJECT: &str = "Congratulations! Next steps in your application";

pub const DEFAULT_BODY: &str = "Hi {name},

Congratulations! You passed both of our technical assessments with a final score of {score}%.

A recruiter will reach out shortly to schedule a conversation about next steps.

Best regards,
The Recruiting Team";

/// Subject and body with `{name}` and `{score}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailTemplate {
    pub subject: String,
    pub body: String,
}

impl Default for EmailTemplate {
    fn default() -> Self {
        Self {
            subject: DEFAULT_SUBJECT.to_string(),
            body: DEFAULT_BODY.to_string(),
        }
    }
}

impl EmailTemplate {
    /// Caller overrides win; anything omitted keeps the default wording.
    pub fn with_overrides(subject: Option<String>, body: Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            subject: subject.unwrap_or(defaults.subject),
            body: body.unwrap_or(defaults.body),
        }
    }

    pub fn render(&self, to: &str, name: &str, score: f64) -> OutgoingEmail {
        let score = format_score(score);
        let fill = |text: &str| text.replace("{name}", name).replace("{score}", &score);
        OutgoingEmail {
            to: to.to_string(),
            subject: fill(&self.subject),
            body: fill(&self.body),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Delivery channel for candidate emails.
pub trait Mailer: Send + Sync {
    fn deliver(&self, email: &OutgoingEmail) -> Result<(), DeliveryError>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmailReceipt {
    pub email: String,
    pub name: String,
    pub score: f64,
}

/// Emails every recipient; a failed or impossible delivery only affects that recipient.
pub fn send_email_batch<M>(
    mailer: &M,
    recipients: &[RecruiterReadyRecord],
    template: &EmailTemplate,
) -> BatchReport<EmailReceipt>
where
    M: Mailer + ?Sized,
{
    let report: BatchReport<EmailReceipt> = recipients
        .iter()
        .map(|recipient| email_one(mailer, recipient, template))
        .collect();

    info!(
        attempted = report.attempted(),
        sent = report.succeeded(),
        failed = report.failed(),
        "email batch finished"
    );
    report
}

fn email_one<M>(
    mailer: &M,
    recipient: &RecruiterReadyRecord,
    template: &EmailTemplate,
) -> Result<EmailReceipt, BatchFailure>
where
    M: Mailer + ?Sized,
{
    let Some(address) = recipient.email() else {
        return Err(BatchFailure::new(
            None,
            recipient.name.as_deref(),
            InviteError::MissingEmail,
        ));
    };

    let name = recipient.display_name();
    let message = template.render(address, name, recipient.score);
    mailer.deliver(&message).map_err(|err| {
        warn!(email = address, error = %err, "email delivery failed");
        BatchFailure::new(Some(address), Some(name), err)
    })?;

    Ok(EmailReceipt {
        email: address.to_string(),
        name: name.to_string(),
        score: recipient.score,
    })
}
