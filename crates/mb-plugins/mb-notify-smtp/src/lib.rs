//! # mb-notify-smtp
//!
//! SMTP implementation of `Notifier` over lettre's async transport.
//! One process-wide transport is built at startup; message templates are
//! fixed per event and submission kind. Delivery is best-effort and callers
//! swallow failures, so nothing here retries.

use anyhow::Context;
use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use mb_core::models::{ModerationStatus, Submission, SubmissionBody};
use mb_core::traits::Notifier;

pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    /// Fixed operator address that receives new-submission alerts.
    operator: Mailbox,
}

impl SmtpNotifier {
    pub fn new(
        host: &str,
        username: String,
        password: String,
        from: &str,
        operator: &str,
    ) -> anyhow::Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(host)?
            .credentials(Credentials::new(username, password))
            .build();
        Ok(Self {
            transport,
            from: from.parse().context("invalid from address")?,
            operator: operator.parse().context("invalid operator address")?,
        })
    }

    async fn send(&self, to: Mailbox, subject: String, body: String) -> anyhow::Result<()> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .body(body)?;
        self.transport.send(message).await?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn submission_received(&self, submission: &Submission) -> anyhow::Result<()> {
        let (subject, body) = received_template(submission);
        self.send(self.operator.clone(), subject, body).await
    }

    async fn decision(&self, submission: &Submission) -> anyhow::Result<()> {
        let to = submission
            .email
            .parse()
            .context("invalid submitter address")?;
        let (subject, body) = decision_template(submission);
        self.send(to, subject, body).await
    }
}

fn received_template(submission: &Submission) -> (String, String) {
    match &submission.body {
        SubmissionBody::Booking {
            lab,
            date,
            start_time,
            end_time,
            faculty,
            equipment,
        } => (
            "New Lab Booking Request".to_string(),
            format!(
                "New booking request received:\n\
                 Name: {}\n\
                 Email: {}\n\
                 Lab: {}\n\
                 Date: {}\n\
                 Time: {} - {}\n\
                 Faculty: {}\n\
                 Equipment: {}\n",
                submission.name,
                submission.email,
                lab,
                date,
                start_time,
                end_time,
                faculty.join(", "),
                equipment.join(", "),
            ),
        ),
        SubmissionBody::Post { title, content } => (
            "New Blog Submission".to_string(),
            format!(
                "New blog post awaiting review:\n\
                 Author: {}\n\
                 Email: {}\n\
                 Title: {}\n\n\
                 {}\n",
                submission.name, submission.email, title, content,
            ),
        ),
    }
}

fn decision_template(submission: &Submission) -> (String, String) {
    let approved = submission.status == ModerationStatus::Approved;
    let outcome = if approved { "Approved" } else { "Rejected" };

    match &submission.body {
        SubmissionBody::Booking {
            lab,
            date,
            start_time,
            end_time,
            ..
        } => {
            let closing = if approved {
                "Please arrive on time and follow all lab safety protocols."
            } else {
                "If you need to book the lab again, please submit a new request."
            };
            (
                format!("Lab Booking {outcome}"),
                format!(
                    "Your lab booking request has been {}.\n\n\
                     Booking details:\n\
                     Lab: {}\n\
                     Date: {}\n\
                     Time: {} - {}\n\n\
                     {}\n",
                    outcome.to_lowercase(),
                    lab,
                    date,
                    start_time,
                    end_time,
                    closing,
                ),
            )
        }
        SubmissionBody::Post { title, .. } => {
            let closing = if approved {
                "Your post is now publicly visible."
            } else {
                "Feel free to revise and submit again."
            };
            (
                format!("Blog Post {outcome}"),
                format!(
                    "Your blog post \"{}\" has been {}.\n\n{}\n",
                    title,
                    outcome.to_lowercase(),
                    closing,
                ),
            )
        }
    }
}
