use crate::models::{Transaction, TransactionFinding};
use serde::Serialize;
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

/// A transaction paired with its finding, if the model produced one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinedTransaction<'a> {
    pub transaction: &'a Transaction,
    pub finding: Option<&'a TransactionFinding>,
}

/// Index of findings by `tx_id`; the first finding for an id wins.
fn index_findings(findings: &[TransactionFinding]) -> HashMap<&str, &TransactionFinding> {
    let mut index = HashMap::with_capacity(findings.len());
    for finding in findings {
        index.entry(finding.tx_id.as_str()).or_insert(finding);
    }
    index
}

/// Pairs every transaction, in input order, with the first finding sharing its `tx_id`.
///
/// A transaction without a `tx_id`, or with no matching finding, joins to `None`.
/// Numeric ids match findings that carry the same digits.
pub fn join_findings<'a>(
    transactions: &'a [Transaction],
    findings: &'a [TransactionFinding],
) -> Vec<JoinedTransaction<'a>> {
    let index = index_findings(findings);
    transactions
        .iter()
        .map(|transaction| JoinedTransaction {
            transaction,
            finding: transaction
                .join_key()
                .and_then(|id| index.get(id.as_ref()).copied()),
        })
        .collect()
}

/// Findings whose `tx_id` matches no transaction, in response order.
pub fn orphaned_findings<'a>(
    transactions: &[Transaction],
    findings: &'a [TransactionFinding],
) -> Vec<&'a TransactionFinding> {
    let known: HashSet<Cow<'_, str>> = transactions
        .iter()
        .filter_map(Transaction::join_key)
        .collect();
    findings
        .iter()
        .filter(|finding| !known.contains(finding.tx_id.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Lenient, RiskLevel};
    use serde_json::json;

    fn tx(id: Option<&str>) -> Transaction {
        Transaction {
            tx_id: id.map(|id| Lenient::from(id.to_string())),
            ..Default::default()
        }
    }

    fn finding(id: &str, level: RiskLevel, reasoning: &str) -> TransactionFinding {
        TransactionFinding {
            tx_id: id.to_string(),
            risk_level: level,
            reasoning: reasoning.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_join_attaches_matching_finding() {
        let transactions = vec![tx(Some("TX-1"))];
        let findings = vec![finding("TX-1", RiskLevel::High, "large")];
        let joined = join_findings(&transactions, &findings);
        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].finding.unwrap().risk_level, RiskLevel::High);
    }

    #[test]
    fn test_join_without_findings_is_not_an_error() {
        let transactions = vec![tx(Some("TX-1"))];
        let joined = join_findings(&transactions, &[]);
        assert_eq!(joined.len(), 1);
        assert!(joined[0].finding.is_none());
    }

    #[test]
    fn test_join_first_duplicate_wins() {
        let transactions = vec![tx(Some("TX-1"))];
        let findings = vec![
            finding("TX-1", RiskLevel::Low, "first"),
            finding("TX-1", RiskLevel::Critical, "second"),
        ];
        let joined = join_findings(&transactions, &findings);
        assert_eq!(joined[0].finding.unwrap().reasoning, "first");
    }

    #[test]
    fn test_join_keeps_transaction_order_and_skips_missing_ids() {
        let transactions = vec![tx(Some("B")), tx(None), tx(Some("A"))];
        let findings = vec![
            finding("A", RiskLevel::Medium, "a"),
            finding("", RiskLevel::Low, "blank id"),
            finding("B", RiskLevel::High, "b"),
        ];
        let joined = join_findings(&transactions, &findings);
        assert_eq!(joined[0].finding.unwrap().reasoning, "b");
        assert!(joined[1].finding.is_none());
        assert_eq!(joined[2].finding.unwrap().reasoning, "a");
    }

    #[test]
    fn test_orphaned_findings() {
        let transactions = vec![tx(Some("TX-1"))];
        let findings = vec![
            finding("TX-9", RiskLevel::High, "orphan"),
            finding("TX-1", RiskLevel::Low, "ok"),
        ];
        let orphans = orphaned_findings(&transactions, &findings);
        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans[0].tx_id, "TX-9");
    }

    #[test]
    fn test_numeric_tx_id_joins_on_digits() {
        let transactions = vec![Transaction {
            tx_id: Some(Lenient::Raw(json!(101))),
            ..Default::default()
        }];
        let findings = vec![finding("101", RiskLevel::Critical, "numeric")];
        let joined = join_findings(&transactions, &findings);
        assert_eq!(joined[0].finding.unwrap().reasoning, "numeric");
        assert!(orphaned_findings(&transactions, &findings).is_empty());
    }
}
