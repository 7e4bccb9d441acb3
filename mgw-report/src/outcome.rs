//! Report-ingestion response narrowing and the outcome message
//!
//! The backend's JSON is parsed into [`PipelineResponse`] and immediately
//! narrowed into a [`SubmissionOutcome`]. Anything that does not fit the
//! expected shape is a [`SubmissionError::MalformedResponse`].

use crate::error::SubmissionError;
use serde::{Deserialize, Serialize};

/// Significant-change threshold for satellite vegetation change, in percent
pub const SIGNIFICANT_CHANGE_PERCENT: f64 = 5.0;

/// Minimum confidence worth showing to the user
pub const CONFIDENCE_DISPLAY_THRESHOLD: f64 = 0.3;

/// Provenance of the coordinates the backend used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateSource {
    Exif,
    BrowserGeolocation,
    None,
}

/// Analysis attached to a successful submission
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub satellite_vegetation_change: Option<f64>,
    #[serde(default)]
    pub coordinate_source: Option<CoordinateSource>,
}

/// Raw `/run-pipeline` response body
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineResponse {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub result: Option<AnalysisResult>,
}

/// Narrowed outcome of one submission attempt
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    Success(AnalysisResult),
    Failure(String),
}

impl From<PipelineResponse> for SubmissionOutcome {
    fn from(response: PipelineResponse) -> Self {
        if response.status == "success" {
            SubmissionOutcome::Success(response.result.unwrap_or_default())
        } else {
            SubmissionOutcome::Failure(response.message.unwrap_or_default())
        }
    }
}

/// Parse and narrow a response body
pub fn parse_pipeline_response(body: &[u8]) -> Result<SubmissionOutcome, SubmissionError> {
    serde_json::from_slice::<PipelineResponse>(body)
        .map(SubmissionOutcome::from)
        .map_err(|e| SubmissionError::MalformedResponse(e.to_string()))
}

/// Build the user-facing message for a successful submission
///
/// Rows are checked in order and the first match wins:
///
/// | label has "mangrove" | satellite change     | message                      |
/// |----------------------|----------------------|------------------------------|
/// | yes                  | > 5                  | confirmed, significant       |
/// | yes                  | 0 < v <= 5           | moderate change, valid       |
/// | yes                  | < 0                  | vegetation loss, valid       |
/// | yes                  | 0                    | no significant change        |
/// | yes                  | absent               | satellite data unavailable   |
/// | no / absent          | any                  | classification, team review  |
///
/// Confidence and coordinate-source notes are appended to every message.
pub fn outcome_message(result: &AnalysisResult) -> String {
    let label = result.label.as_deref().filter(|l| !l.is_empty());
    let satellite = result.satellite_vegetation_change;

    let mut message = match (label, satellite) {
        (Some(label), Some(v)) if label.contains("mangrove") => {
            if v > SIGNIFICANT_CHANGE_PERCENT {
                format!(
                    "Excellent! Both AI analysis and satellite data confirm significant vegetation \
                     change of {:.1}% in the last 30 days. Your report has been verified!",
                    v
                )
            } else if v > 0.0 {
                format!(
                    "Both AI and satellite analysis show moderate vegetation change of {:.1}% \
                     in the last 30 days. Valid report!",
                    v
                )
            } else if v < 0.0 {
                format!(
                    "Both AI and satellite analysis show {:.1}% vegetation loss in the last \
                     30 days. Valid report!",
                    v.abs()
                )
            } else {
                format!(
                    "AI detected mangrove issue ({}), but satellite analysis shows no significant \
                     vegetation change in the last 30 days. Our team will investigate further.",
                    label
                )
            }
        }
        (Some(label), None) if label.contains("mangrove") => format!(
            "AI detected mangrove issue ({}). Satellite data unavailable for this location. \
             Our team will investigate further.",
            label
        ),
        (label, satellite) => {
            let mut msg = format!(
                "Report submitted. AI classification: {}.",
                label.unwrap_or("none")
            );
            if let Some(v) = satellite {
                msg.push_str(&format!(
                    " Satellite analysis shows {:.1}% vegetation change in the last 30 days.",
                    v
                ));
            }
            msg.push_str(" Our team will review your submission.");
            msg
        }
    };

    if let Some(confidence) = result.confidence.filter(|c| *c > CONFIDENCE_DISPLAY_THRESHOLD) {
        message.push_str(&format!(" (AI Confidence: {}%)", (confidence * 100.0).round()));
    }

    match result.coordinate_source {
        Some(CoordinateSource::Exif) => message.push_str(" [Coordinates from image]"),
        Some(CoordinateSource::BrowserGeolocation) => {
            message.push_str(" [Coordinates from device location]")
        }
        Some(CoordinateSource::None) => message.push_str(
            " [No coordinates available] Warning: no GPS coordinates could be derived from \
             the image EXIF data.",
        ),
        None => {}
    }

    message
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analysis(label: Option<&str>, satellite: Option<f64>) -> AnalysisResult {
        AnalysisResult {
            label: label.map(str::to_string),
            satellite_vegetation_change: satellite,
            ..Default::default()
        }
    }

    #[test]
    fn test_significant_change_is_confirmed() {
        let msg = outcome_message(&analysis(Some("mangrove_cutting"), Some(7.2)));
        assert!(msg.contains("significant"));
        assert!(msg.contains("verified"));
        assert!(msg.contains("7.2%"));
    }

    #[test]
    fn test_boundary_five_percent_is_moderate() {
        let msg = outcome_message(&analysis(Some("mangrove_dumping"), Some(5.0)));
        assert!(msg.contains("moderate"));
        assert!(msg.contains("5.0%"));
    }

    #[test]
    fn test_negative_change_is_loss() {
        let msg = outcome_message(&analysis(Some("mangrove_cutting"), Some(-3.5)));
        assert!(msg.contains("loss"));
        assert!(msg.contains("3.5%"));
        assert!(!msg.contains("-3.5"));
    }

    #[test]
    fn test_zero_change_is_under_investigation() {
        let msg = outcome_message(&analysis(Some("mangrove_cutting"), Some(0.0)));
        assert!(msg.contains("no significant vegetation change"));
        assert!(msg.contains("mangrove_cutting"));
        assert!(msg.contains("investigate"));
    }

    #[test]
    fn test_missing_satellite_data() {
        let msg = outcome_message(&analysis(Some("mangrove_cutting"), None));
        assert!(msg.contains("Satellite data unavailable"));
        assert!(msg.contains("investigate"));
    }

    #[test]
    fn test_non_mangrove_label_goes_to_review() {
        let msg = outcome_message(&analysis(Some("garbage"), Some(2.25)));
        assert!(msg.contains("AI classification: garbage"));
        assert!(msg.contains("2.2%") || msg.contains("2.3%"));
        assert!(msg.contains("review"));

        let msg = outcome_message(&analysis(None, None));
        assert!(msg.contains("AI classification: none"));
    }

    #[test]
    fn test_label_match_is_case_sensitive() {
        let msg = outcome_message(&analysis(Some("Mangrove"), Some(9.0)));
        assert!(msg.contains("AI classification: Mangrove"));
    }

    #[test]
    fn test_confidence_annotation_threshold() {
        let mut result = analysis(Some("mangrove_cutting"), Some(7.2));
        result.confidence = Some(0.82);
        assert!(outcome_message(&result).contains("(AI Confidence: 82%)"));

        result.confidence = Some(0.3);
        assert!(!outcome_message(&result).contains("AI Confidence"));
    }

    #[test]
    fn test_coordinate_source_annotations() {
        let mut result = analysis(Some("mangrove_cutting"), Some(7.2));
        result.coordinate_source = Some(CoordinateSource::Exif);
        assert!(outcome_message(&result).ends_with("[Coordinates from image]"));

        result.coordinate_source = Some(CoordinateSource::BrowserGeolocation);
        assert!(outcome_message(&result).contains("[Coordinates from device location]"));
    }

    #[test]
    fn test_no_coordinates_warns_regardless_of_label() {
        for (label, satellite) in [
            (Some("mangrove_cutting"), Some(7.2)),
            (Some("mangrove_cutting"), Some(-1.0)),
            (Some("unknown"), None),
            (None, Some(0.0)),
        ] {
            let mut result = analysis(label, satellite);
            result.coordinate_source = Some(CoordinateSource::None);
            let msg = outcome_message(&result);
            assert!(msg.contains("EXIF"), "missing EXIF warning in: {}", msg);
        }
    }

    #[test]
    fn test_parse_success_response() {
        let body = br#"{"status":"success","result":{"label":"mangrove_cutting","confidence":0.82,
            "satellite_vegetation_change":6.1,"coordinate_source":"exif","extra":"ignored"}}"#;
        match parse_pipeline_response(body).unwrap() {
            SubmissionOutcome::Success(result) => {
                assert_eq!(result.label.as_deref(), Some("mangrove_cutting"));
                assert_eq!(result.coordinate_source, Some(CoordinateSource::Exif));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_parse_success_with_nulls() {
        let body = br#"{"status":"success","result":{"label":null,"satellite_vegetation_change":null}}"#;
        assert_eq!(
            parse_pipeline_response(body).unwrap(),
            SubmissionOutcome::Success(AnalysisResult::default())
        );
    }

    #[test]
    fn test_parse_error_response() {
        let body = br#"{"status":"error","message":"image is required"}"#;
        assert_eq!(
            parse_pipeline_response(body).unwrap(),
            SubmissionOutcome::Failure("image is required".to_string())
        );
    }

    #[test]
    fn test_unexpected_shapes_are_malformed() {
        for body in [
            &b"<html>502 Bad Gateway</html>"[..],
            br#"{"message":"no status"}"#,
            br#"{"status":"success","result":{"coordinate_source":"gps"}}"#,
            br#"{"status":"success","result":{"confidence":"high"}}"#,
        ] {
            assert!(matches!(
                parse_pipeline_response(body),
                Err(SubmissionError::MalformedResponse(_))
            ));
        }
    }
}
