//! Core orchestration of a scan: validation, the two concurrent data
//! branches, score composition, and the best-effort lead notification.

use crate::audit;
use crate::config::Config;
use crate::domain::normalize_domain;
use crate::error::{AppError, Result};
use crate::models::{
    OnPageData, PositioningData, ScanOutcome, ScanRequest, ScanResult, Sourced,
};
use crate::notify::LeadNotifier;
use crate::positioning::{fallback_positioning, score_positioning};
use crate::ranking::RankingClient;
use reqwest::Client;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct SeoScanner {
    config: Arc<Config>,
    http_client: Client,
    ranking: RankingClient,
    notifier: LeadNotifier,
}

impl SeoScanner {
    /// Creates a scanner with shared HTTP clients and the lead notifier.
    pub(crate) fn new(config: Arc<Config>) -> Result<Self> {
        let http_client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.request_timeout)
            .build()?;
        let ranking = RankingClient::new(config.clone())?;
        let notifier = LeadNotifier::new(config.clone())?;

        Ok(Self {
            config,
            http_client,
            ranking,
            notifier,
        })
    }

    /// Runs the full pipeline for one scan request.
    ///
    /// The only hard failure is request validation. Each data branch catches
    /// its own upstream failure and substitutes fallback data, so the
    /// pipeline always completes; the notification is best-effort and can
    /// never change the response.
    pub(crate) async fn run_scan(&self, request: &ScanRequest) -> Result<ScanOutcome> {
        if request.url.trim().is_empty() || request.email.trim().is_empty() {
            return Err(AppError::MissingFields);
        }

        let domain = normalize_domain(&request.url);
        tracing::info!(target: "scan_task",
            "Scanning {} (domain: {}) for lead {}", request.url, domain, request.email
        );

        let (onpage, positioning) = futures::join!(
            self.audit_branch(&request.url),
            self.positioning_branch(&domain)
        );

        let Sourced {
            data: onpage_data,
            origin: onpage_origin,
        } = onpage;
        let Sourced {
            data: positioning_data,
            origin: positioning_origin,
        } = positioning;

        let result = compose_result(positioning_data, onpage_data);

        tracing::info!(target: "scan_task",
            "Scan of {} composed: visibility {} (positioning {}, technical {})",
            domain, result.visibility_score, result.positioning_score, result.technical_score
        );

        if let Err(e) = self.notifier.send_lead_alert(request, &domain, &result).await {
            tracing::warn!(target: "scan_task",
                "Lead notification failed, response unaffected: {}", e
            );
        }

        Ok(ScanOutcome {
            result,
            onpage_origin,
            positioning_origin,
        })
    }

    async fn audit_branch(&self, url: &str) -> Sourced<OnPageData> {
        match audit::audit_page(&self.http_client, url, &self.config).await {
            Ok(data) => Sourced::live(data),
            Err(e) => {
                tracing::warn!(target: "scan_task",
                    "On-page audit of {} failed, substituting empty audit: {}", url, e
                );
                Sourced::fallback(OnPageData::unavailable(), e.to_string())
            }
        }
    }

    async fn positioning_branch(&self, domain: &str) -> Sourced<PositioningData> {
        match self.ranking.snapshot(domain).await {
            Ok(snapshot) => Sourced::live(score_positioning(&snapshot, domain)),
            Err(e) => {
                tracing::warn!(target: "scan_task",
                    "Ranking lookup for {} failed, substituting fallback positioning: {}", domain, e
                );
                Sourced::fallback(fallback_positioning(domain), e.to_string())
            }
        }
    }
}

/// The composite score shown to the lead: the plain average of the two
/// sub-scores, rounded.
pub(crate) fn visibility_score(positioning_score: u8, technical_score: u8) -> u8 {
    (0.5 * positioning_score as f64 + 0.5 * technical_score as f64).round() as u8
}

pub(crate) fn compose_result(positioning: PositioningData, on_page_data: OnPageData) -> ScanResult {
    ScanResult {
        visibility_score: visibility_score(
            positioning.positioning_score,
            on_page_data.technical_score,
        ),
        positioning_score: positioning.positioning_score,
        technical_score: on_page_data.technical_score,
        keywords: positioning.keywords,
        financial_loss: positioning.financial_loss,
        competitors: positioning.competitors,
        missing_pages: positioning.missing_pages,
        on_page_data,
    }
}
