//! Maps raw chain logs to user-facing messages.

use serde::Serialize;
use std::fmt;

/// Category of a chain-side rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionKind {
    SequenceMismatch,
    FeeTooLow,
    InsufficientFunds,
    FeeChanged,
    Other,
}

// First match wins; patterns are lowercase.
const RULES: &[(&[&str], RejectionKind)] = &[
    (&["account sequence mismatch", "incorrect account sequence"], RejectionKind::SequenceMismatch),
    (&["insufficient fee"], RejectionKind::FeeTooLow),
    (&["insufficient funds"], RejectionKind::InsufficientFunds),
    (&["fee", "is smaller than"], RejectionKind::FeeChanged),
];

impl RejectionKind {
    /// Classifies a raw log, case-insensitively.
    #[must_use]
    pub fn classify(raw_log: &str) -> Self {
        let lower = raw_log.to_lowercase();
        RULES
            .iter()
            .find(|(patterns, _)| patterns.iter().any(|p| lower.contains(p)))
            .map_or(Self::Other, |(_, kind)| *kind)
    }

    /// `true` when resubmitting with fresh account state or fees can succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::SequenceMismatch | Self::FeeTooLow | Self::FeeChanged)
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SequenceMismatch => "sequence_mismatch",
            Self::FeeTooLow => "fee_too_low",
            Self::InsufficientFunds => "insufficient_funds",
            Self::FeeChanged => "fee_changed",
            Self::Other => "other",
        }
    }

    fn user_message(&self) -> Option<&'static str> {
        match self {
            Self::SequenceMismatch => Some("Sequence mismatch, please try again"),
            Self::FeeTooLow => Some("Insufficient fees, please try again"),
            Self::InsufficientFunds => Some("Insufficient funds, please try again"),
            Self::FeeChanged => Some("Fee changed while sending transaction, please try again"),
            Self::Other => None,
        }
    }
}

impl fmt::Display for RejectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind and user message for `raw_log`. Unrecognized logs are passed through verbatim.
#[must_use]
pub fn classify_chain_error(raw_log: &str) -> (RejectionKind, String) {
    let kind = RejectionKind::classify(raw_log);
    let message = kind.user_message().map_or_else(|| raw_log.to_string(), str::to_string);
    (kind, message)
}
