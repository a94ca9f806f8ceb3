use anyhow::Context;
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

#[derive(Debug, Clone)]
pub struct MailAttachment {
    pub filename: String,
    pub content_type: String,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub attachment: Option<MailAttachment>,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: Email) -> anyhow::Result<()>;
}

/// Sends mail through an authenticated SMTP relay.
pub struct SmtpMailer {
    from: Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(server: &str, port: u16, from: &str, password: &str) -> anyhow::Result<Self> {
        let from_mailbox: Mailbox = from
            .parse()
            .with_context(|| format!("invalid sender address: {from}"))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(server)
            .with_context(|| format!("invalid SMTP relay: {server}"))?
            .port(port)
            .credentials(Credentials::new(from.to_string(), password.to_string()))
            .build();

        Ok(Self {
            from: from_mailbox,
            transport,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: Email) -> anyhow::Result<()> {
        let to: Mailbox = email
            .to
            .parse()
            .with_context(|| format!("invalid recipient address: {}", email.to))?;

        let builder = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject);

        let message = match email.attachment {
            Some(attachment) => {
                let content_type = ContentType::parse(&attachment.content_type)
                    .context("invalid attachment content type")?;
                builder.multipart(
                    MultiPart::mixed()
                        .singlepart(SinglePart::plain(email.body))
                        .singlepart(
                            Attachment::new(attachment.filename).body(attachment.body, content_type),
                        ),
                )
            }
            None => builder.header(ContentType::TEXT_PLAIN).body(email.body),
        }
        .context("failed to build email")?;

        self.transport
            .send(message)
            .await
            .context("failed to send email over SMTP")?;

        Ok(())
    }
}
