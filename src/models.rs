//! Defines the core data structures used in the seo-scan service.
//!
//! Everything here is a per-scan value object: constructed fresh for each
//! incoming request, never mutated after composition, never persisted. Wire
//! types serialize as camelCase JSON to match the front-end simulator.

use serde::{Deserialize, Serialize};

/// The incoming scan request.
///
/// Fields default to empty strings so an absent field and an empty field hit
/// the same validation gate in the orchestrator.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub(crate) struct ScanRequest {
    /// Free-text URL of the page to audit (scheme optional).
    #[serde(default)]
    pub url: String,
    /// The lead's contact email.
    #[serde(default)]
    pub email: String,
}

/// Verdict for a single on-page signal.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub(crate) enum SignalStatus {
    Good,
    Warning,
    Error,
}

/// A text-bearing on-page attribute (title, meta description).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub(crate) struct OnPageSignal {
    /// The extracted text, trimmed.
    pub text: String,
    /// Character count of `text`.
    pub length: usize,
    pub status: SignalStatus,
}

/// The H1 signal: count-based rather than length-based.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub(crate) struct HeadingSignal {
    /// Text of the first H1 element, trimmed.
    pub text: String,
    /// Number of H1 elements on the page.
    pub count: usize,
    pub status: SignalStatus,
}

/// Image alt-text coverage.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ImageStats {
    pub total: usize,
    /// Images lacking a non-empty `alt` attribute.
    pub without_alt: usize,
}

/// Aggregated on-page SEO signals for the audited page, plus the derived
/// technical sub-score (0-100).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OnPageData {
    pub title: OnPageSignal,
    pub meta_description: OnPageSignal,
    pub h1: HeadingSignal,
    pub h2_count: usize,
    pub images: ImageStats,
    pub has_viewport: bool,
    pub has_canonical: bool,
    pub has_open_graph: bool,
    pub technical_score: u8,
}

impl OnPageData {
    /// The substitute used when the page fetch fails: zero-valued signals,
    /// every status `error`, technical score 0.
    pub(crate) fn unavailable() -> Self {
        Self {
            title: OnPageSignal {
                text: String::new(),
                length: 0,
                status: SignalStatus::Error,
            },
            meta_description: OnPageSignal {
                text: String::new(),
                length: 0,
                status: SignalStatus::Error,
            },
            h1: HeadingSignal {
                text: String::new(),
                count: 0,
                status: SignalStatus::Error,
            },
            h2_count: 0,
            images: ImageStats {
                total: 0,
                without_alt: 0,
            },
            has_viewport: false,
            has_canonical: false,
            has_open_graph: false,
            technical_score: 0,
        }
    }
}

/// A keyword shown to the lead, either a real gap from the suggestion engine
/// or a synthetic branded guess.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub(crate) struct KeywordEntry {
    pub keyword: String,
    /// Monthly search volume.
    pub volume: u32,
    /// Ranking difficulty, 0-100.
    pub difficulty: u8,
    /// Current rank position; 0 means not ranking.
    pub position: u32,
}

/// The positioning half of the scan: ranking strength plus the sales-facing
/// estimates derived from it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PositioningData {
    /// Bounded 5-100; never reports zero.
    pub positioning_score: u8,
    /// At most 5 entries, preferring real gaps over the branded fallback.
    pub keywords: Vec<KeywordEntry>,
    /// Estimated monthly loss in euros, floored at 350.
    pub financial_loss: u32,
    pub competitors: u32,
    pub missing_pages: u32,
}

/// The externally visible composite result.
///
/// Invariant: `visibility_score` is always
/// `round(0.5 * positioning_score + 0.5 * technical_score)`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ScanResult {
    pub visibility_score: u8,
    pub positioning_score: u8,
    pub technical_score: u8,
    pub keywords: Vec<KeywordEntry>,
    pub financial_loss: u32,
    pub competitors: u32,
    pub missing_pages: u32,
    pub on_page_data: OnPageData,
}

/// Which path produced a branch's data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DataOrigin {
    /// Computed from live upstream data.
    Live,
    /// Substituted after an upstream failure; carries the cause.
    Fallback { reason: String },
}

impl DataOrigin {
    pub(crate) fn is_fallback(&self) -> bool {
        matches!(self, DataOrigin::Fallback { .. })
    }
}

/// Branch output paired with its origin, so callers and tests can assert
/// *which* path was taken rather than just the final shape.
#[derive(Debug, Clone)]
pub(crate) struct Sourced<T> {
    pub data: T,
    pub origin: DataOrigin,
}

impl<T> Sourced<T> {
    pub(crate) fn live(data: T) -> Self {
        Self {
            data,
            origin: DataOrigin::Live,
        }
    }

    pub(crate) fn fallback(data: T, reason: String) -> Self {
        Self {
            data,
            origin: DataOrigin::Fallback { reason },
        }
    }
}

/// The orchestrator's full answer: the composite result plus the origin of
/// each branch. Only `result` crosses the HTTP boundary.
#[derive(Debug, Clone)]
pub(crate) struct ScanOutcome {
    pub result: ScanResult,
    pub onpage_origin: DataOrigin,
    pub positioning_origin: DataOrigin,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_onpage_data_is_all_zero() {
        let data = OnPageData::unavailable();
        assert_eq!(data.technical_score, 0);
        assert_eq!(data.title.status, SignalStatus::Error);
        assert_eq!(data.meta_description.status, SignalStatus::Error);
        assert_eq!(data.h1.status, SignalStatus::Error);
        assert_eq!(data.h2_count, 0);
        assert_eq!(data.images.total, 0);
        assert!(!data.has_viewport);
        assert!(!data.has_canonical);
        assert!(!data.has_open_graph);
    }

    #[test]
    fn test_scan_result_serializes_camel_case() {
        let result = ScanResult {
            visibility_score: 3,
            positioning_score: 5,
            technical_score: 0,
            keywords: vec![KeywordEntry {
                keyword: "example avis".to_string(),
                volume: 880,
                difficulty: 35,
                position: 0,
            }],
            financial_loss: 350,
            competitors: 3,
            missing_pages: 3,
            on_page_data: OnPageData::unavailable(),
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["visibilityScore"], 3);
        assert_eq!(json["financialLoss"], 350);
        assert_eq!(json["onPageData"]["technicalScore"], 0);
        assert_eq!(json["onPageData"]["metaDescription"]["status"], "error");
        assert_eq!(json["onPageData"]["images"]["withoutAlt"], 0);
        assert_eq!(json["keywords"][0]["position"], 0);
    }

    #[test]
    fn test_scan_request_tolerates_missing_fields() {
        let request: ScanRequest = serde_json::from_str("{}").unwrap();
        assert!(request.url.is_empty());
        assert!(request.email.is_empty());
    }
}
