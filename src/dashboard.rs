//! Read-only projection of one completed analysis for the presentation layer.

use crate::gateway::{AnalysisMetadata, CompletedAnalysis};
use crate::join::{join_findings, orphaned_findings};
use crate::models::{
    Explainability, FraudAnalysisOutput, Lenient, OverallAssessment, PatternAnalysis, RiskLevel,
    Transaction, TransactionFinding,
};
use serde::Serialize;
use std::borrow::Cow;

const NO_ANOMALIES: &str = "No significant anomalies detected.";

/// Risk/safe split of the overall score, clamped to 0..=100.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreGauge {
    pub risk: f64,
    pub safe: f64,
}

impl ScoreGauge {
    pub fn from_score(score: f64) -> Self {
        let risk = if score.is_finite() {
            score.clamp(0.0, 100.0)
        } else {
            0.0
        };
        Self {
            risk,
            safe: 100.0 - risk,
        }
    }
}

/// Historical inflow vs outflow totals; 0 when the summary omits them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CashFlowTotals {
    pub inflows: f64,
    pub outflows: f64,
}

/// Number of findings at each risk level.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RiskDistribution {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
    pub critical: usize,
    pub unrecognized: usize,
}

impl RiskDistribution {
    pub fn from_findings(findings: &[TransactionFinding]) -> Self {
        let mut distribution = Self::default();
        for finding in findings {
            match finding.risk_level {
                RiskLevel::Low => distribution.low += 1,
                RiskLevel::Medium => distribution.medium += 1,
                RiskLevel::High => distribution.high += 1,
                RiskLevel::Critical => distribution.critical += 1,
                RiskLevel::Unrecognized(_) => distribution.unrecognized += 1,
            }
        }
        distribution
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionCard {
    pub transaction: Transaction,
    /// `None` renders the card without an analysis panel.
    pub finding: Option<TransactionFinding>,
}

fn profile_text(field: &Option<Lenient<String>>) -> Option<String> {
    field
        .as_ref()
        .and_then(|value| value.as_text())
        .map(Cow::into_owned)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub business_id: Option<String>,
    pub business_name: Option<String>,
    pub overall_assessment: OverallAssessment,
    pub score_gauge: ScoreGauge,
    pub pattern_analysis: PatternAnalysis,
    pub explainability: Explainability,
    pub cash_flow: CashFlowTotals,
    pub risk_distribution: RiskDistribution,
    pub transaction_count: usize,
    pub transactions: Vec<TransactionCard>,
    /// Findings that reference no submitted transaction; never shown on a card.
    pub orphaned_findings: Vec<TransactionFinding>,
    pub metadata: AnalysisMetadata,
}

impl DashboardView {
    pub fn build(analysis: &CompletedAnalysis) -> Self {
        let input = &analysis.input;
        let FraudAnalysisOutput {
            overall_assessment,
            transaction_findings,
            pattern_analysis,
            explainability,
        } = &analysis.output;

        let transactions = join_findings(&input.recent_transactions, transaction_findings)
            .into_iter()
            .map(|joined| TransactionCard {
                transaction: joined.transaction.clone(),
                finding: joined.finding.cloned(),
            })
            .collect();

        let mut pattern_analysis = pattern_analysis.clone();
        if pattern_analysis.anomaly_summary.trim().is_empty() {
            pattern_analysis.anomaly_summary = NO_ANOMALIES.to_string();
        }

        let summary = input.historical_summary.as_ref();
        let cash_flow = CashFlowTotals {
            inflows: summary
                .and_then(|s| s.total_inflows.as_ref())
                .and_then(|total| total.as_f64())
                .unwrap_or(0.0),
            outflows: summary
                .and_then(|s| s.total_outflows.as_ref())
                .and_then(|total| total.as_f64())
                .unwrap_or(0.0),
        };

        Self {
            business_id: profile_text(&input.sme_profile.business_id),
            business_name: profile_text(&input.sme_profile.business_name),
            overall_assessment: overall_assessment.clone(),
            score_gauge: ScoreGauge::from_score(overall_assessment.overall_risk_score_0_to_100),
            pattern_analysis,
            explainability: explainability.clone(),
            cash_flow,
            risk_distribution: RiskDistribution::from_findings(transaction_findings),
            transaction_count: input.recent_transactions.len(),
            transactions,
            orphaned_findings: orphaned_findings(&input.recent_transactions, transaction_findings)
                .into_iter()
                .cloned()
                .collect(),
            metadata: analysis.metadata.clone(),
        }
    }
}
