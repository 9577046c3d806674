use lettre::{
    message::{header::ContentType, Mailbox, Message},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Tokio1Executor,
};
use rust_decimal::Decimal;

use kairos_common::{AppError, SmtpConfig};

/// Fire-and-forget enrollment confirmation mail. Delivery failures are
/// logged and never propagate into the enrollment transaction.
#[derive(Clone)]
pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    config: SmtpConfig,
}

impl Mailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, AppError> {
        if !config.enabled {
            return Ok(Self {
                transport: AsyncSmtpTransport::<Tokio1Executor>::unencrypted_localhost(),
                config: config.clone(),
            });
        }

        let creds = Credentials::new(config.username.clone(), config.password.clone());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .map_err(|e| AppError::Internal(format!("SMTP relay error: {}", e)))?
            .credentials(creds)
            .build();

        Ok(Self {
            transport,
            config: config.clone(),
        })
    }

    pub fn spawn_enrollment_confirmation(
        &self,
        to: String,
        student_names: Vec<String>,
        total_due: Decimal,
    ) {
        let mailer = self.clone();
        tokio::spawn(async move {
            if let Err(e) = mailer.send_enrollment_confirmation(&to, &student_names, total_due).await
            {
                tracing::warn!("enrollment confirmation mail to {} failed: {}", to, e);
            }
        });
    }

    async fn send_enrollment_confirmation(
        &self,
        to: &str,
        student_names: &[String],
        total_due: Decimal,
    ) -> Result<(), AppError> {
        if !self.config.enabled {
            tracing::info!("mail disabled, skipping enrollment confirmation to {}", to);
            return Ok(());
        }

        let body = format!(
            "Hemos recibido la matrícula de: {}.\n\nValor total pendiente: ${} COP.\n\n\
             Academia Kairos",
            student_names.join(", "),
            total_due
        );

        self.send(to, "Confirmación de matrícula - Academia Kairos", &body).await
    }

    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), AppError> {
        let from_mailbox: Mailbox =
            format!("{} <{}>", self.config.from_name, self.config.from_email)
                .parse()
                .map_err(|e| AppError::Internal(format!("Invalid from address: {}", e)))?;

        let to_mailbox: Mailbox = to
            .parse()
            .map_err(|e| AppError::Internal(format!("Invalid to address: {}", e)))?;

        let message = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| AppError::Internal(format!("Failed to build email: {}", e)))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to send email: {}", e)))?;

        tracing::info!("enrollment confirmation sent to {}", to);
        Ok(())
    }
}
