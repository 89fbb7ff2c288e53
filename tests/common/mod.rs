//! Shared fixtures for the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use fraudguard_api::config::Config;
use fraudguard_api::errors::AppError;
use fraudguard_api::gateway::TextGenerator;
use fraudguard_api::validator::ValidationMode;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const ONE_TX_INPUT: &str = r#"{
    "sme_profile": {"business_id": "SME-1", "business_name": "Acme Trading"},
    "recent_transactions": [{"tx_id": "TX-1", "direction": "inflow", "amount": 29500, "currency": "CAD"}],
    "historical_summary": {"total_inflows": 1000, "total_outflows": 800}
}"#;

pub fn analysis_json(findings: serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "overall_assessment": {
            "risk_level": "High",
            "primary_concern": "Funds forwarded offshore within an hour",
            "overall_risk_score_0_to_100": 74
        },
        "transaction_findings": findings,
        "pattern_analysis": {
            "anomaly_summary": "Rapid in/out movement",
            "suspicious_invoice_patterns": ["Sequential invoice numbers"],
            "potential_structuring_or_layering": "Yes - pass-through pattern",
            "cash_flow_risk": {"cash_gap_risk_level": "Medium", "reasoning": "Outflow matches inflow"},
            "financial_distress_risk_level": "Low",
            "financial_distress_reasoning": "Turnover consistent with profile"
        },
        "explainability": {
            "key_factors_in_risk_assessment": ["New offshore counterparty"],
            "limitations": ["No account balance provided"]
        }
    })
}

pub fn high_risk_tx1() -> serde_json::Value {
    analysis_json(serde_json::json!([{
        "tx_id": "TX-1",
        "risk_level": "High",
        "risk_score_0_to_100": 88,
        "flags": ["new_counterparty", "offshore_counterparty"],
        "reasoning": "First payment from a free-zone entity, far above history.",
        "recommended_action": "Consider SAR/STR (if jurisdiction requires)"
    }]))
}

/// Helper function to create test config
pub fn test_config(base_url: &str, api_key: Option<&str>) -> Config {
    Config {
        port: 8080,
        api_key: api_key.map(str::to_string),
        gemini_base_url: base_url.to_string(),
        gemini_model: "gemini-2.5-flash".to_string(),
        request_timeout_secs: 5,
        validation_mode: ValidationMode::Structural,
    }
}

/// Returns the same reply for every call and counts calls.
pub struct StubGenerator {
    pub reply: String,
    pub calls: AtomicUsize,
}

impl StubGenerator {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for StubGenerator {
    fn model(&self) -> &str {
        "stub"
    }

    async fn generate(&self, _system_instruction: &str, _prompt: &str) -> Result<String, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }
}
