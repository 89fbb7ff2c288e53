//! Contract validation at the trust boundary.
//!
//! Two tiers:
//!
//! - **Structural** (always on): the text is JSON, the required top-level
//!   sections are present and non-null, and each section has a JSON shape the
//!   model types can hold. Leaf values of the wrong JSON type are accepted.
//! - **Strict** (opt-in): leaves have their documented JSON types, enumerated
//!   values are in their vocabularies, scores are within 0..=100, transaction
//!   ids are usable as join keys.

use crate::errors::AppError;
use crate::models::{Direction, FraudAnalysisOutput, FraudInput, Lenient, RiskLevel};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use std::str::FromStr;

pub const INPUT_REQUIRED_FIELDS: [&str; 2] = ["sme_profile", "recent_transactions"];

pub const OUTPUT_REQUIRED_FIELDS: [&str; 4] = [
    "overall_assessment",
    "transaction_findings",
    "pattern_analysis",
    "explainability",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ValidationMode {
    #[default]
    Structural,
    Strict,
}

impl FromStr for ValidationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "structural" => Ok(ValidationMode::Structural),
            "strict" => Ok(ValidationMode::Strict),
            other => Err(format!(
                "VALIDATION_MODE must be 'structural' or 'strict', got '{}'",
                other
            )),
        }
    }
}

fn parse_json(text: &str) -> Result<Value, AppError> {
    serde_json::from_str(text).map_err(|e| AppError::MalformedJson(e.to_string()))
}

/// Absent and `null` both count as missing. A non-object top level has no keys.
fn require_fields(value: &Value, fields: &[&str]) -> Result<(), AppError> {
    for field in fields {
        match value.get(field) {
            None | Some(Value::Null) => {
                return Err(AppError::MissingRequiredField((*field).to_string()))
            }
            Some(_) => {}
        }
    }
    Ok(())
}

/// Parses user-supplied text into a [`FraudInput`] (structural tier only).
pub fn parse_input(text: &str) -> Result<FraudInput, AppError> {
    parse_input_with(text, ValidationMode::Structural)
}

pub fn parse_input_with(text: &str, mode: ValidationMode) -> Result<FraudInput, AppError> {
    let value = parse_json(text)?;
    require_fields(&value, &INPUT_REQUIRED_FIELDS)?;

    let input = FraudInput::deserialize(&value).map_err(AppError::from)?;

    if mode == ValidationMode::Strict {
        validate_input(&value, &input)?;
    }
    Ok(input)
}

/// Parses model-returned text into a [`FraudAnalysisOutput`] (structural tier only).
///
/// Empty text is reported as [`AppError::EmptyResponse`] before any JSON parsing.
pub fn parse_output(text: &str) -> Result<FraudAnalysisOutput, AppError> {
    parse_output_with(text, ValidationMode::Structural)
}

pub fn parse_output_with(text: &str, mode: ValidationMode) -> Result<FraudAnalysisOutput, AppError> {
    if text.trim().is_empty() {
        return Err(AppError::EmptyResponse);
    }
    let value = parse_json(text)?;
    require_fields(&value, &OUTPUT_REQUIRED_FIELDS)?;

    let output = FraudAnalysisOutput::deserialize(&value).map_err(AppError::from)?;

    if mode == ValidationMode::Strict {
        validate_output(&value, &output)?;
    }
    Ok(output)
}

#[derive(Debug, Clone, Copy)]
enum Leaf {
    Text,
    Number,
    Flag,
    TextList,
}

impl Leaf {
    fn accepts(self, value: &Value) -> bool {
        match self {
            Leaf::Text => value.is_string(),
            Leaf::Number => value.is_number(),
            Leaf::Flag => value.is_boolean(),
            Leaf::TextList => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
        }
    }

    fn expected(self) -> &'static str {
        match self {
            Leaf::Text => "a string",
            Leaf::Number => "a number",
            Leaf::Flag => "a boolean",
            Leaf::TextList => "a list of strings",
        }
    }
}

const SME_PROFILE_LEAVES: &[(&str, Leaf)] = &[
    ("business_id", Leaf::Text),
    ("business_name", Leaf::Text),
    ("industry", Leaf::Text),
    ("jurisdiction", Leaf::Text),
    ("monthly_turnover_estimate", Leaf::Number),
    ("risk_rating_internal", Leaf::Text),
    ("onboarded_date", Leaf::Text),
];

const ACTIVITY_PROFILE_LEAVES: &[(&str, Leaf)] = &[
    ("avg_monthly_inflows", Leaf::Number),
    ("avg_monthly_outflows", Leaf::Number),
    ("primary_channels", Leaf::TextList),
    ("main_counterparty_countries", Leaf::TextList),
];

const TRANSACTION_LEAVES: &[(&str, Leaf)] = &[
    ("tx_id", Leaf::Text),
    ("timestamp", Leaf::Text),
    ("direction", Leaf::Text),
    ("amount", Leaf::Number),
    ("currency", Leaf::Text),
    ("counterparty_name", Leaf::Text),
    ("counterparty_country", Leaf::Text),
    ("payment_channel", Leaf::Text),
    ("description", Leaf::Text),
    ("invoice_reference", Leaf::Text),
    ("is_new_counterparty", Leaf::Flag),
    ("historical_avg_amount_for_counterparty", Leaf::Number),
    ("kyc_risk_flags", Leaf::TextList),
    ("is_related_party", Leaf::Flag),
];

const HISTORICAL_SUMMARY_LEAVES: &[(&str, Leaf)] = &[
    ("lookback_period_days", Leaf::Number),
    ("total_inflows", Leaf::Number),
    ("total_outflows", Leaf::Number),
    ("avg_txn_amount", Leaf::Number),
    ("max_txn_amount", Leaf::Number),
    ("typical_counterparty_countries", Leaf::TextList),
    ("unusual_activity_flags_last_90_days", Leaf::TextList),
];

const OVERALL_ASSESSMENT_LEAVES: &[(&str, Leaf)] = &[
    ("risk_level", Leaf::Text),
    ("primary_concern", Leaf::Text),
    ("overall_risk_score_0_to_100", Leaf::Number),
];

const FINDING_LEAVES: &[(&str, Leaf)] = &[
    ("tx_id", Leaf::Text),
    ("risk_level", Leaf::Text),
    ("risk_score_0_to_100", Leaf::Number),
    ("flags", Leaf::TextList),
    ("reasoning", Leaf::Text),
    ("recommended_action", Leaf::Text),
];

const PATTERN_ANALYSIS_LEAVES: &[(&str, Leaf)] = &[
    ("anomaly_summary", Leaf::Text),
    ("suspicious_invoice_patterns", Leaf::TextList),
    ("potential_structuring_or_layering", Leaf::Text),
    ("financial_distress_risk_level", Leaf::Text),
    ("financial_distress_reasoning", Leaf::Text),
];

const CASH_FLOW_RISK_LEAVES: &[(&str, Leaf)] = &[
    ("cash_gap_risk_level", Leaf::Text),
    ("reasoning", Leaf::Text),
];

const EXPLAINABILITY_LEAVES: &[(&str, Leaf)] = &[
    ("key_factors_in_risk_assessment", Leaf::TextList),
    ("limitations", Leaf::TextList),
];

/// Checks the JSON type of each listed leaf of `section`. Absent and `null` leaves pass.
fn check_leaves(
    path: &str,
    section: Option<&Value>,
    leaves: &[(&str, Leaf)],
) -> Result<(), AppError> {
    let Some(section) = section else {
        return Ok(());
    };
    for &(key, leaf) in leaves {
        match section.get(key) {
            None | Some(Value::Null) => {}
            Some(value) if leaf.accepts(value) => {}
            Some(value) => {
                return Err(AppError::InvalidField(format!(
                    "{}.{}: expected {}, got {}",
                    path,
                    key,
                    leaf.expected(),
                    value
                )))
            }
        }
    }
    Ok(())
}

fn check_list_items(
    path: &str,
    list: Option<&Value>,
    leaves: &[(&str, Leaf)],
) -> Result<(), AppError> {
    let items = list
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    for (i, item) in items.iter().enumerate() {
        check_leaves(&format!("{}[{}]", path, i), Some(item), leaves)?;
    }
    Ok(())
}

fn check_output_leaves(raw: &Value) -> Result<(), AppError> {
    check_leaves(
        "overall_assessment",
        raw.get("overall_assessment"),
        OVERALL_ASSESSMENT_LEAVES,
    )?;
    check_list_items(
        "transaction_findings",
        raw.get("transaction_findings"),
        FINDING_LEAVES,
    )?;
    let pattern = raw.get("pattern_analysis");
    check_leaves("pattern_analysis", pattern, PATTERN_ANALYSIS_LEAVES)?;
    check_leaves(
        "pattern_analysis.cash_flow_risk",
        pattern.and_then(|p| p.get("cash_flow_risk")),
        CASH_FLOW_RISK_LEAVES,
    )?;
    check_leaves(
        "explainability",
        raw.get("explainability"),
        EXPLAINABILITY_LEAVES,
    )
}

fn check_input_leaves(raw: &Value) -> Result<(), AppError> {
    let profile = raw.get("sme_profile");
    check_leaves("sme_profile", profile, SME_PROFILE_LEAVES)?;
    check_leaves(
        "sme_profile.expected_activity_profile",
        profile.and_then(|p| p.get("expected_activity_profile")),
        ACTIVITY_PROFILE_LEAVES,
    )?;
    check_list_items(
        "recent_transactions",
        raw.get("recent_transactions"),
        TRANSACTION_LEAVES,
    )?;
    check_leaves(
        "historical_summary",
        raw.get("historical_summary"),
        HISTORICAL_SUMMARY_LEAVES,
    )
}

fn check_level(path: &str, level: &RiskLevel, allow_critical: bool) -> Result<(), AppError> {
    let ok = if allow_critical {
        level.is_recognized()
    } else {
        level.is_band_level()
    };
    if ok {
        return Ok(());
    }
    let allowed = if allow_critical {
        "Low, Medium, High, Critical"
    } else {
        "Low, Medium, High"
    };
    Err(AppError::InvalidField(format!(
        "{}: '{}' is not one of {}",
        path, level, allowed
    )))
}

fn check_score(path: &str, score: f64) -> Result<(), AppError> {
    if score.is_finite() && (0.0..=100.0).contains(&score) {
        Ok(())
    } else {
        Err(AppError::InvalidField(format!(
            "{}: {} is outside 0..=100",
            path, score
        )))
    }
}

/// Strict-tier checks on a structurally valid analysis and the JSON it was
/// built from. Reports the first violation.
pub fn validate_output(raw: &Value, output: &FraudAnalysisOutput) -> Result<(), AppError> {
    check_output_leaves(raw)?;

    let overall = &output.overall_assessment;
    check_level("overall_assessment.risk_level", &overall.risk_level, true)?;
    check_score(
        "overall_assessment.overall_risk_score_0_to_100",
        overall.overall_risk_score_0_to_100,
    )?;

    for (i, finding) in output.transaction_findings.iter().enumerate() {
        let path = format!("transaction_findings[{}]", i);
        if finding.tx_id.trim().is_empty() {
            return Err(AppError::InvalidField(format!("{}.tx_id is empty", path)));
        }
        check_level(&format!("{}.risk_level", path), &finding.risk_level, true)?;
        check_score(
            &format!("{}.risk_score_0_to_100", path),
            finding.risk_score_0_to_100,
        )?;
        if !finding.recommended_action.is_recognized() {
            return Err(AppError::InvalidField(format!(
                "{}.recommended_action: '{}' is not a recognised action",
                path, finding.recommended_action
            )));
        }
    }

    let pattern = &output.pattern_analysis;
    check_level(
        "pattern_analysis.cash_flow_risk.cash_gap_risk_level",
        &pattern.cash_flow_risk.cash_gap_risk_level,
        false,
    )?;
    check_level(
        "pattern_analysis.financial_distress_risk_level",
        &pattern.financial_distress_risk_level,
        false,
    )?;

    Ok(())
}

/// Strict-tier checks on a structurally valid input and the JSON it was built
/// from. Reports the first violation.
pub fn validate_input(raw: &Value, input: &FraudInput) -> Result<(), AppError> {
    check_input_leaves(raw)?;

    let mut seen = HashSet::new();
    for (i, tx) in input.recent_transactions.iter().enumerate() {
        let path = format!("recent_transactions[{}]", i);
        let tx_id = tx
            .tx_id
            .as_ref()
            .and_then(Lenient::typed)
            .map(|id| id.trim())
            .unwrap_or_default();
        if tx_id.is_empty() {
            return Err(AppError::InvalidField(format!("{}.tx_id is missing", path)));
        }
        if !seen.insert(tx_id) {
            return Err(AppError::InvalidField(format!(
                "{}.tx_id '{}' is duplicated",
                path, tx_id
            )));
        }
        if let Some(Lenient::Typed(Direction::Unrecognized(raw))) = &tx.direction {
            return Err(AppError::InvalidField(format!(
                "{}.direction: '{}' is not one of inflow, outflow",
                path, raw
            )));
        }
        if let Some(&amount) = tx.amount.as_ref().and_then(Lenient::typed) {
            if !amount.is_finite() || amount < 0.0 {
                return Err(AppError::InvalidField(format!(
                    "{}.amount: {} must be a non-negative number",
                    path, amount
                )));
            }
        }
    }
    Ok(())
}
