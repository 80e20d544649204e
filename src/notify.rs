//! Lead notification: emails a French-language scan summary to the agency's
//! internal distribution list.
//!
//! From the orchestrator's point of view this is fire-and-forget: a failed or
//! skipped send must never change the scan response.

use crate::config::Config;
use crate::error::Result;
use crate::models::{ScanRequest, ScanResult};
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct LeadNotifier {
    /// `None` when no SMTP host is configured; sends become logged skips.
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    config: Arc<Config>,
}

impl LeadNotifier {
    pub(crate) fn new(config: Arc<Config>) -> Result<Self> {
        let transport = if config.smtp_host.is_empty() {
            None
        } else {
            let mut builder =
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
                    .port(config.smtp_port);
            if !config.smtp_username.is_empty() {
                builder = builder.credentials(Credentials::new(
                    config.smtp_username.clone(),
                    config.smtp_password.clone(),
                ));
            }
            Some(builder.build())
        };

        Ok(Self { transport, config })
    }

    /// Sends the lead summary for a completed scan.
    ///
    /// # Arguments
    /// * `request` - The original submission; its email becomes the Reply-To.
    /// * `domain` - The normalized domain that was scanned.
    /// * `result` - The composed scan result.
    pub(crate) async fn send_lead_alert(
        &self,
        request: &ScanRequest,
        domain: &str,
        result: &ScanResult,
    ) -> Result<()> {
        let Some(transport) = &self.transport else {
            tracing::info!(target: "notify_task",
                "SMTP not configured, skipping lead notification for {}", request.email
            );
            return Ok(());
        };

        let mut builder = Message::builder()
            .from(self.config.lead_sender.parse::<Mailbox>()?)
            .reply_to(request.email.parse::<Mailbox>()?)
            .subject(format!("Nouveau lead SEO Audit — {}", request.url));
        for recipient in &self.config.lead_recipients {
            builder = builder.to(recipient.parse::<Mailbox>()?);
        }

        let email = builder
            .header(ContentType::TEXT_HTML)
            .body(lead_email_html(request, domain, result))?;

        transport.send(email).await?;

        tracing::info!(target: "notify_task",
            "Lead notification sent for {} ({})", request.email, domain
        );
        Ok(())
    }
}

/// Groups digits in threes with non-breaking spaces, French style:
/// 1200 -> "1 200".
fn format_eur(amount: u32) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('\u{a0}');
        }
        grouped.push(c);
    }
    grouped
}

fn lead_email_html(request: &ScanRequest, domain: &str, result: &ScanResult) -> String {
    format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; color: #333;">
  <h1 style="color: #D4AF37; border-bottom: 2px solid #D4AF37; padding-bottom: 12px;">
    Nouveau lead — Audit SEO
  </h1>

  <table style="width: 100%; border-collapse: collapse; margin-top: 16px;">
    <tr><td style="padding: 8px 0; font-weight: bold; width: 100px;">Email</td><td><a href="mailto:{email}">{email}</a></td></tr>
    <tr><td style="padding: 8px 0; font-weight: bold;">URL</td><td><a href="{url}">{url}</a></td></tr>
    <tr><td style="padding: 8px 0; font-weight: bold;">Domaine</td><td>{domain}</td></tr>
  </table>

  <h2 style="margin-top: 24px;">Résultats du scan</h2>
  <table style="width: 100%; border-collapse: collapse;">
    <tr><td style="padding: 8px 0; font-weight: bold; width: 160px;">Score visibilité</td><td>{visibility}/100</td></tr>
    <tr><td style="padding: 8px 0; font-weight: bold;">Positionnement</td><td>{positioning}/100</td></tr>
    <tr><td style="padding: 8px 0; font-weight: bold;">Technique</td><td>{technical}/100</td></tr>
    <tr><td style="padding: 8px 0; font-weight: bold;">Manque à gagner</td><td>{loss} €/mois</td></tr>
    <tr><td style="padding: 8px 0; font-weight: bold;">Concurrents</td><td>{competitors}</td></tr>
  </table>

  <hr style="margin-top: 32px; border: none; border-top: 1px solid #eee;">
  <p style="color: #999; font-size: 12px;">Envoyé depuis l'outil Audit SEO — agaigency.com</p>
</div>"#,
        email = request.email,
        url = request.url,
        domain = domain,
        visibility = result.visibility_score,
        positioning = result.positioning_score,
        technical = result.technical_score,
        loss = format_eur(result.financial_loss),
        competitors = result.competitors,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OnPageData;

    #[test]
    fn test_format_eur_groups_thousands() {
        assert_eq!(format_eur(0), "0");
        assert_eq!(format_eur(350), "350");
        assert_eq!(format_eur(1200), "1\u{a0}200");
        assert_eq!(format_eur(12500), "12\u{a0}500");
        assert_eq!(format_eur(1234567), "1\u{a0}234\u{a0}567");
    }

    #[test]
    fn test_lead_email_contains_scan_summary() {
        let request = ScanRequest {
            url: "https://example.com".to_string(),
            email: "lead@test.com".to_string(),
        };
        let result = ScanResult {
            visibility_score: 28,
            positioning_score: 20,
            technical_score: 36,
            keywords: Vec::new(),
            financial_loss: 2350,
            competitors: 5,
            missing_pages: 7,
            on_page_data: OnPageData::unavailable(),
        };

        let html = lead_email_html(&request, "example.com", &result);
        assert!(html.contains("mailto:lead@test.com"));
        assert!(html.contains("https://example.com"));
        assert!(html.contains("28/100"));
        assert!(html.contains("2\u{a0}350 €/mois"));
        assert!(html.contains("Nouveau lead — Audit SEO"));
    }

    #[test]
    fn test_notifier_disabled_without_smtp_host() {
        let notifier = LeadNotifier::new(Arc::new(Config::default())).unwrap();
        assert!(notifier.transport.is_none());
    }
}
