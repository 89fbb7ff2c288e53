use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::fmt;

/// Treats an explicit JSON `null` like an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Strings stay as they are, `null` is empty, any other JSON is rendered as text.
fn value_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text,
        other => other.to_string(),
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_text(Value::deserialize(deserializer)?))
}

/// A lone scalar becomes a one-element list.
fn lenient_text_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => Vec::new(),
        Value::Array(items) => items.into_iter().map(value_text).collect(),
        other => vec![value_text(other)],
    })
}

/// Numbers and numeric strings. `null` is 0 and anything else is NaN.
fn lenient_score<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => 0.0,
        Value::Number(number) => number.as_f64().unwrap_or(f64::NAN),
        Value::String(text) => text.trim().parse().unwrap_or(f64::NAN),
        _ => f64::NAN,
    })
}

// ============ Lenient Leaves ============

/// An input leaf holding the expected type when the JSON has it, otherwise
/// the JSON verbatim.
///
/// Mistyped leaves pass structural validation and serialize back unchanged;
/// strict validation reports them.
#[derive(Debug, Clone, PartialEq)]
pub enum Lenient<T> {
    Typed(T),
    Raw(Value),
}

impl<T> Lenient<T> {
    pub fn typed(&self) -> Option<&T> {
        match self {
            Lenient::Typed(value) => Some(value),
            Lenient::Raw(_) => None,
        }
    }
}

impl Lenient<String> {
    /// The text itself, or a number/boolean rendered as text (`101`, `true`).
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Lenient::Typed(text) => Some(Cow::Borrowed(text.as_str())),
            Lenient::Raw(raw @ (Value::Number(_) | Value::Bool(_))) => {
                Some(Cow::Owned(raw.to_string()))
            }
            Lenient::Raw(_) => None,
        }
    }
}

impl Lenient<f64> {
    /// The number itself, or a numeric string parsed.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Lenient::Typed(number) => Some(*number),
            Lenient::Raw(Value::String(text)) => text.trim().parse().ok(),
            Lenient::Raw(_) => None,
        }
    }
}

impl<T> From<T> for Lenient<T> {
    fn from(value: T) -> Self {
        Lenient::Typed(value)
    }
}

impl<T: Serialize> Serialize for Lenient<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Lenient::Typed(value) => value.serialize(serializer),
            Lenient::Raw(raw) => raw.serialize(serializer),
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Lenient<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        Ok(match T::deserialize(&raw) {
            Ok(value) => Lenient::Typed(value),
            Err(_) => Lenient::Raw(raw),
        })
    }
}

// ============ Vocabularies ============

/// Ordinal risk level: `Low < Medium < High < Critical`.
///
/// Text outside the vocabulary is kept verbatim in `Unrecognized` (which sorts
/// last) so the structural validation tier can accept it and the strict tier
/// can report it. Non-string JSON is kept as its JSON text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "Value", into = "String")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
    Unrecognized(String),
}

impl RiskLevel {
    pub fn as_str(&self) -> &str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
            RiskLevel::Critical => "Critical",
            RiskLevel::Unrecognized(raw) => raw,
        }
    }

    /// Ordinal position, `None` for unrecognized text.
    pub fn rank(&self) -> Option<u8> {
        match self {
            RiskLevel::Low => Some(0),
            RiskLevel::Medium => Some(1),
            RiskLevel::High => Some(2),
            RiskLevel::Critical => Some(3),
            RiskLevel::Unrecognized(_) => None,
        }
    }

    pub fn is_recognized(&self) -> bool {
        self.rank().is_some()
    }

    /// Cash-gap and financial-distress levels stop at `High`.
    pub fn is_band_level(&self) -> bool {
        matches!(self, RiskLevel::Low | RiskLevel::Medium | RiskLevel::High)
    }
}

impl Default for RiskLevel {
    fn default() -> Self {
        RiskLevel::Unrecognized(String::new())
    }
}

impl From<String> for RiskLevel {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "Low" => RiskLevel::Low,
            "Medium" => RiskLevel::Medium,
            "High" => RiskLevel::High,
            "Critical" => RiskLevel::Critical,
            _ => RiskLevel::Unrecognized(raw),
        }
    }
}

impl From<Value> for RiskLevel {
    fn from(raw: Value) -> Self {
        RiskLevel::from(value_text(raw))
    }
}

impl From<RiskLevel> for String {
    fn from(level: RiskLevel) -> Self {
        match level {
            RiskLevel::Unrecognized(raw) => raw,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recommended follow-up for a single transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Value", into = "String")]
pub enum RecommendedAction {
    NoAction,
    Monitor,
    RequestMoreInformation,
    FileInternalAlert,
    ConsiderSarStr,
    Unrecognized(String),
}

impl RecommendedAction {
    pub fn as_str(&self) -> &str {
        match self {
            RecommendedAction::NoAction => "No action",
            RecommendedAction::Monitor => "Monitor",
            RecommendedAction::RequestMoreInformation => "Request more information",
            RecommendedAction::FileInternalAlert => "File internal alert",
            RecommendedAction::ConsiderSarStr => "Consider SAR/STR (if jurisdiction requires)",
            RecommendedAction::Unrecognized(raw) => raw,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, RecommendedAction::Unrecognized(_))
    }
}

impl Default for RecommendedAction {
    fn default() -> Self {
        RecommendedAction::Unrecognized(String::new())
    }
}

impl From<String> for RecommendedAction {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "No action" => RecommendedAction::NoAction,
            "Monitor" => RecommendedAction::Monitor,
            "Request more information" => RecommendedAction::RequestMoreInformation,
            "File internal alert" => RecommendedAction::FileInternalAlert,
            "Consider SAR/STR" | "Consider SAR/STR (if jurisdiction requires)" => {
                RecommendedAction::ConsiderSarStr
            }
            _ => RecommendedAction::Unrecognized(raw),
        }
    }
}

impl From<Value> for RecommendedAction {
    fn from(raw: Value) -> Self {
        RecommendedAction::from(value_text(raw))
    }
}

impl From<RecommendedAction> for String {
    fn from(action: RecommendedAction) -> Self {
        match action {
            RecommendedAction::Unrecognized(raw) => raw,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for RecommendedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Money movement direction relative to the SME.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Direction {
    Inflow,
    Outflow,
    Unrecognized(String),
}

impl From<String> for Direction {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "inflow" => Direction::Inflow,
            "outflow" => Direction::Outflow,
            _ => Direction::Unrecognized(raw),
        }
    }
}

impl From<Direction> for String {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Inflow => "inflow".to_string(),
            Direction::Outflow => "outflow".to_string(),
            Direction::Unrecognized(raw) => raw,
        }
    }
}

// ============ Input Models ============
//
// Every leaf is optional and lenient, and unknown keys are kept in `extra`, so
// a payload survives parse -> serialize unchanged and reaches the prompt intact.

/// Identity and expected-behaviour baseline for one business.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SmeProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_id: Option<Lenient<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_name: Option<Lenient<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<Lenient<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jurisdiction: Option<Lenient<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_turnover_estimate: Option<Lenient<f64>>,
    /// Internal qualitative rating, e.g. "Medium".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_rating_internal: Option<Lenient<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub onboarded_date: Option<Lenient<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_activity_profile: Option<ExpectedActivityProfile>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// What normal monthly activity looks like for the SME.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpectedActivityProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_monthly_inflows: Option<Lenient<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_monthly_outflows: Option<Lenient<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_channels: Option<Lenient<Vec<String>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_counterparty_countries: Option<Lenient<Vec<String>>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One observed money movement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Join key for findings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_id: Option<Lenient<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Lenient<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<Lenient<Direction>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Lenient<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<Lenient<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counterparty_name: Option<Lenient<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counterparty_country: Option<Lenient<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_channel: Option<Lenient<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Lenient<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_reference: Option<Lenient<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_new_counterparty: Option<Lenient<bool>>,
    /// 0 when the counterparty has no history.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub historical_avg_amount_for_counterparty: Option<Lenient<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kyc_risk_flags: Option<Lenient<Vec<String>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_related_party: Option<Lenient<bool>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Transaction {
    /// `tx_id` as the text findings are matched against; numeric ids match their digits.
    pub fn join_key(&self) -> Option<Cow<'_, str>> {
        self.tx_id.as_ref().and_then(|id| id.as_text())
    }
}

/// Aggregate statistics over the lookback window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoricalSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lookback_period_days: Option<Lenient<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_inflows: Option<Lenient<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_outflows: Option<Lenient<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_txn_amount: Option<Lenient<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_txn_amount: Option<Lenient<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typical_counterparty_countries: Option<Lenient<Vec<String>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unusual_activity_flags_last_90_days: Option<Lenient<Vec<String>>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The payload submitted for analysis.
///
/// Presence of `sme_profile` and `recent_transactions` is enforced by
/// [`crate::validator::parse_input`] before this type is built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FraudInput {
    pub sme_profile: SmeProfile,
    pub recent_transactions: Vec<Transaction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub historical_summary: Option<HistoricalSummary>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ============ Output Models ============
//
// Leaves are coerced rather than rejected: scalars become text, numeric
// strings become scores. Strict validation checks the raw JSON types.

/// Per-transaction verdict, keyed by `tx_id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionFinding {
    #[serde(default, deserialize_with = "lenient_text")]
    pub tx_id: String,
    #[serde(default)]
    pub risk_level: RiskLevel,
    #[serde(default, deserialize_with = "lenient_score")]
    pub risk_score_0_to_100: f64,
    #[serde(default, deserialize_with = "lenient_text_list")]
    pub flags: Vec<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub reasoning: String,
    #[serde(default)]
    pub recommended_action: RecommendedAction,
}

/// Cash-gap sub-assessment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CashFlowRisk {
    /// Low, Medium or High.
    #[serde(default)]
    pub cash_gap_risk_level: RiskLevel,
    #[serde(default, deserialize_with = "lenient_text")]
    pub reasoning: String,
}

/// Account-level narrative.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternAnalysis {
    #[serde(default, deserialize_with = "lenient_text")]
    pub anomaly_summary: String,
    #[serde(default, deserialize_with = "lenient_text_list")]
    pub suspicious_invoice_patterns: Vec<String>,
    /// "Yes/No with explanation."
    #[serde(default, deserialize_with = "lenient_text")]
    pub potential_structuring_or_layering: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cash_flow_risk: CashFlowRisk,
    /// Low, Medium or High.
    #[serde(default)]
    pub financial_distress_risk_level: RiskLevel,
    #[serde(default, deserialize_with = "lenient_text")]
    pub financial_distress_reasoning: String,
}

/// Headline verdict. The score is independent of the per-finding scores.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverallAssessment {
    #[serde(default)]
    pub risk_level: RiskLevel,
    #[serde(default, deserialize_with = "lenient_text")]
    pub primary_concern: String,
    #[serde(default, deserialize_with = "lenient_score")]
    pub overall_risk_score_0_to_100: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Explainability {
    #[serde(default, deserialize_with = "lenient_text_list")]
    pub key_factors_in_risk_assessment: Vec<String>,
    #[serde(default, deserialize_with = "lenient_text_list")]
    pub limitations: Vec<String>,
}

/// The model's assessment, built once per analysis and never mutated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FraudAnalysisOutput {
    pub overall_assessment: OverallAssessment,
    pub transaction_findings: Vec<TransactionFinding>,
    pub pattern_analysis: PatternAnalysis,
    pub explainability: Explainability,
}
