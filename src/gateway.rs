//! One request/response cycle against the external inference service.

use crate::config::Config;
use crate::errors::AppError;
use crate::models::{FraudAnalysisOutput, FraudInput};
use crate::prompt::{build_prompt, SYSTEM_INSTRUCTION};
use crate::validator::parse_output_with;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

/// An opaque text-generation capability.
///
/// Implementations must ask the model for JSON-only output.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Model identifier, reported in analysis metadata.
    fn model(&self) -> &str;

    async fn generate(&self, system_instruction: &str, prompt: &str) -> Result<String, AppError>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisMetadata {
    pub analysis_id: Uuid,
    pub model: String,
    pub analyzed_at: DateTime<Utc>,
    pub duration_ms: u64,
}

/// A validated input together with the validated reply it produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletedAnalysis {
    pub input: FraudInput,
    pub output: FraudAnalysisOutput,
    pub metadata: AnalysisMetadata,
}

#[derive(Clone)]
pub struct AnalysisGateway {
    config: Config,
    generator: Arc<dyn TextGenerator>,
}

impl AnalysisGateway {
    pub fn new(config: Config, generator: Arc<dyn TextGenerator>) -> Self {
        Self { config, generator }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Sends `input` to the model and validates the reply.
    ///
    /// Fails with `CredentialMissing` before any I/O when no key is configured.
    /// Every call is independent: nothing is cached or retried.
    pub async fn analyze(&self, input: &FraudInput) -> Result<FraudAnalysisOutput, AppError> {
        self.config.credential()?;

        let prompt = build_prompt(input)?;
        tracing::info!(
            "Submitting {} transactions for analysis ({} prompt bytes)",
            input.recent_transactions.len(),
            prompt.len()
        );

        let text = self.generator.generate(SYSTEM_INSTRUCTION, &prompt).await?;
        tracing::debug!("Model returned {} bytes", text.len());

        let output = parse_output_with(&text, self.config.validation_mode)?;
        tracing::info!(
            "Analysis validated: overall risk {} ({}), {} findings",
            output.overall_assessment.risk_level,
            output.overall_assessment.overall_risk_score_0_to_100,
            output.transaction_findings.len()
        );
        Ok(output)
    }

    /// [`Self::analyze`] plus an analysis id, timing and model name, all logged under one span.
    pub async fn run(&self, input: FraudInput) -> Result<CompletedAnalysis, AppError> {
        let analysis_id = Uuid::new_v4();
        let span = tracing::info_span!("analysis", %analysis_id, model = %self.generator.model());
        let started = Instant::now();

        let result = self.analyze(&input).instrument(span).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(output) => {
                tracing::info!(%analysis_id, "✓ Analysis completed in {}ms", duration_ms);
                Ok(CompletedAnalysis {
                    input,
                    output,
                    metadata: AnalysisMetadata {
                        analysis_id,
                        model: self.generator.model().to_string(),
                        analyzed_at: Utc::now(),
                        duration_ms,
                    },
                })
            }
            Err(e) => {
                tracing::warn!(%analysis_id, "Analysis failed after {}ms: {}", duration_ms, e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Deterministic generator returning a canned reply and recording its calls.
    pub(crate) struct CannedGenerator {
        reply: Result<String, AppError>,
        pub(crate) calls: AtomicUsize,
        pub(crate) last_prompt: Mutex<Option<(String, String)>>,
    }

    impl CannedGenerator {
        pub(crate) fn replying(text: &str) -> Self {
            Self::with(Ok(text.to_string()))
        }

        pub(crate) fn failing(err: AppError) -> Self {
            Self::with(Err(err))
        }

        fn with(reply: Result<String, AppError>) -> Self {
            Self {
                reply,
                calls: AtomicUsize::new(0),
                last_prompt: Mutex::new(None),
            }
        }

        pub(crate) fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TextGenerator for CannedGenerator {
        fn model(&self) -> &str {
            "canned"
        }

        async fn generate(&self, system_instruction: &str, prompt: &str) -> Result<String, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_prompt.lock().unwrap() =
                Some((system_instruction.to_string(), prompt.to_string()));
            self.reply.clone()
        }
    }

    pub(crate) fn test_config(api_key: Option<&str>) -> Config {
        Config {
            port: 3000,
            api_key: api_key.map(str::to_string),
            gemini_base_url: "http://127.0.0.1:9".to_string(),
            gemini_model: "canned".to_string(),
            request_timeout_secs: 5,
            validation_mode: crate::validator::ValidationMode::Structural,
        }
    }

    pub(crate) const HIGH_RISK_REPLY: &str = r#"{
        "overall_assessment": {"risk_level": "High", "primary_concern": "Offshore pass-through", "overall_risk_score_0_to_100": 81},
        "transaction_findings": [{"tx_id": "TX-1", "risk_level": "High", "risk_score_0_to_100": 85, "flags": ["offshore"], "reasoning": "New offshore payer.", "recommended_action": "File internal alert"}],
        "pattern_analysis": {"anomaly_summary": "", "suspicious_invoice_patterns": [], "potential_structuring_or_layering": "No", "cash_flow_risk": {"cash_gap_risk_level": "Low", "reasoning": "ok"}, "financial_distress_risk_level": "Low", "financial_distress_reasoning": "ok"},
        "explainability": {"key_factors_in_risk_assessment": ["offshore"], "limitations": []}
    }"#;
}
