//! Contracts for the outbound services the analysis hands results to.
//!
//! Neither service is required: every structured result is produced without them. Closures
//! implement both traits, so callers can plug in a mailer or a text model without wrapper
//! types.

use crate::anomaly::AnomalyRecord;
use crate::report::AnalysisReport;
use log::{info, warn};
use serde::{Deserialize, Serialize};

pub const DEFAULT_ALERT_MESSAGE: &str =
    "Please review this expense and provide additional information if needed.";

/// Delivers a message. Returns whether delivery succeeded.
pub trait MessageSender {
    fn send_message(&self, recipient: &str, subject: &str, body: &str) -> bool;
}

impl<F> MessageSender for F
where
    F: Fn(&str, &str, &str) -> bool,
{
    fn send_message(&self, recipient: &str, subject: &str, body: &str) -> bool {
        self(recipient, subject, body)
    }
}

/// Turns a prompt context into natural-language text.
pub trait TextGenerator {
    fn generate_text_summary(&self, prompt_context: &str) -> String;
}

impl<F> TextGenerator for F
where
    F: Fn(&str) -> String,
{
    fn generate_text_summary(&self, prompt_context: &str) -> String {
        self(prompt_context)
    }
}

/// A message asking an employee to explain one flagged transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyAlert {
    /// Pre-filled when the employee field holds an address
    pub suggested_recipient: Option<String>,
    pub subject: String,
    pub body: String,
}

impl AnomalyAlert {
    pub fn compose(record: &AnomalyRecord, message: Option<&str>) -> Self {
        let t = &record.transaction;
        let notes = if t.notes.is_empty() { "N/A" } else { t.notes.as_str() };
        let body = format!(
            "Dear {},\n\n\
             We have detected the following anomaly in your expense submission:\n\n\
             Date: {}\n\
             Amount: {:.2}\n\
             Vendor: {}\n\
             Category: {}\n\
             Anomaly Type: {}\n\
             Notes: {}\n\n\
             {}\n\n\
             Best regards,\n\
             Finance Team\n",
            t.employee,
            t.date,
            t.amount,
            t.vendor,
            t.category,
            record.anomaly_type,
            notes,
            message.unwrap_or(DEFAULT_ALERT_MESSAGE),
        );

        Self {
            suggested_recipient: suggested_recipient(record),
            subject: "Expense Anomaly Alert".to_string(),
            body,
        }
    }

    /// Sends through `sender`. A blank recipient is refused without calling the sender.
    pub fn send(&self, sender: &dyn MessageSender, recipient: &str) -> bool {
        let recipient = recipient.trim();
        if recipient.is_empty() {
            warn!("Not sending anomaly alert: no recipient given");
            return false;
        }

        let delivered = sender.send_message(recipient, &self.subject, &self.body);
        if delivered {
            info!("Anomaly alert sent to {}", recipient);
        } else {
            warn!("Anomaly alert to {} was not delivered", recipient);
        }
        delivered
    }
}

/// The employee field, when it looks like an address.
pub fn suggested_recipient(record: &AnomalyRecord) -> Option<String> {
    let employee = record.transaction.employee.trim();
    employee.contains('@').then(|| employee.to_string())
}

/// One summary message covering a whole set of flagged transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FraudDigest {
    pub subject: String,
    pub body: String,
}

impl FraudDigest {
    /// `None` when there is nothing to report.
    pub fn compose(records: &[AnomalyRecord]) -> Option<Self> {
        if records.is_empty() {
            return None;
        }

        let count = records.len();
        let total: f64 = records.iter().map(|r| r.transaction.amount).sum();

        Some(Self {
            subject: format!("Fraud Alert - {} Suspicious Transactions", count),
            body: format!(
                "Dear Founder/Investor,\n\n\
                 We have detected {} suspicious transactions totaling ${} in your recent \
                 financial data. Please review the attached details and take necessary action.\n\n\
                 Best regards,\n\
                 Finance Assistant\n",
                count,
                format_currency(total)
            ),
        })
    }

    pub fn send(&self, sender: &dyn MessageSender, recipient: &str) -> bool {
        sender.send_message(recipient, &self.subject, &self.body)
    }
}

/// `1234567.5` -> `1,234,567.50`
fn format_currency(amount: f64) -> String {
    let formatted = format!("{:.2}", amount.abs());
    let (whole, fraction) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, fraction)
}

/// Plain-text digest of a report, suitable as context for a text generator.
pub fn prompt_context(report: &AnalysisReport) -> String {
    let metrics = &report.metrics;
    let mut context = format!(
        "Transactions: {}\nTotal amount: {:.2}\nIncome: {:.2}\nExpenses: {:.2}\nNet: {:.2}\n",
        metrics.transaction_count,
        metrics.total_amount,
        metrics.cash_flow.income,
        metrics.cash_flow.expenses,
        metrics.cash_flow.net
    );
    context.push_str(&format!(
        "Rule-based anomalies: {}\nStatistical anomalies: {}\n",
        report.rule_anomalies.len(),
        report.statistical_anomalies.len()
    ));
    context.push_str(&format!(
        "Burn rate: {:.2} per month\nRunway: {}\n",
        report.burn_rate, report.runway
    ));
    if let Some(outlook) = &report.forecast_outlook {
        context.push_str(&format!(
            "Last actual: {:.2}\nLast forecast: {:.2}\n",
            outlook.last_actual, outlook.last_forecast
        ));
    }
    context
}

/// Full prompt: report context followed by the operator's question.
pub fn build_prompt(report: &AnalysisReport, question: &str) -> String {
    format!(
        "Financial Data Context: {}\n\nUser Question: {}",
        prompt_context(report),
        question
    )
}

/// Asks `generator` about the report. `None` without a generator.
pub fn explain(
    report: &AnalysisReport,
    question: &str,
    generator: Option<&dyn TextGenerator>,
) -> Option<String> {
    generator.map(|g| g.generate_text_summary(&build_prompt(report, question)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anomaly::AnomalyType;
    use crate::schema::Transaction;
    use chrono::NaiveDate;
    use std::cell::RefCell;

    fn record(employee: &str) -> AnomalyRecord {
        let t = Transaction::new(
            "EXP-3",
            NaiveDate::from_ymd_opt(2024, 2, 14).unwrap(),
            1530.0,
            "Meals",
        )
        .with_vendor("Bistro")
        .with_employee(employee);
        AnomalyRecord::from_rule(&t, AnomalyType::UnusuallyHighAmount)
    }

    #[test]
    fn test_alert_body_lists_transaction() {
        let alert = AnomalyAlert::compose(&record("dana@example.com"), None);
        assert_eq!(alert.subject, "Expense Anomaly Alert");
        assert!(alert.body.starts_with("Dear dana@example.com,"));
        assert!(alert.body.contains("Amount: 1530.00\n"));
        assert!(alert.body.contains("Anomaly Type: Unusually High Amount\n"));
        assert!(alert.body.contains("Notes: N/A\n"));
        assert!(alert.body.contains(DEFAULT_ALERT_MESSAGE));
        assert_eq!(
            alert.suggested_recipient.as_deref(),
            Some("dana@example.com")
        );
    }

    #[test]
    fn test_no_suggestion_for_plain_names() {
        assert_eq!(suggested_recipient(&record("Dana Smith")), None);
    }

    #[test]
    fn test_send_uses_closure_sender() {
        let sent = RefCell::new(Vec::new());
        let sender = |to: &str, subject: &str, _body: &str| {
            sent.borrow_mut().push((to.to_string(), subject.to_string()));
            true
        };
        let alert = AnomalyAlert::compose(&record("Dana"), Some("Receipt please."));
        assert!(alert.body.contains("Receipt please."));
        assert!(alert.send(&sender, "dana@example.com"));
        assert!(!alert.send(&sender, "  "));
        assert_eq!(sent.borrow().len(), 1);
        assert_eq!(sent.borrow()[0].1, "Expense Anomaly Alert");
    }

    #[test]
    fn test_fraud_digest() {
        let records = vec![record("a"), record("b")];
        let digest = FraudDigest::compose(&records).unwrap();
        assert_eq!(digest.subject, "Fraud Alert - 2 Suspicious Transactions");
        assert!(digest.body.contains("totaling $3,060.00"));
        assert!(FraudDigest::compose(&[]).is_none());
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(0.0), "0.00");
        assert_eq!(format_currency(999.999), "1,000.00");
        assert_eq!(format_currency(1_234_567.5), "1,234,567.50");
        assert_eq!(format_currency(-42.0), "-42.00");
    }
}
