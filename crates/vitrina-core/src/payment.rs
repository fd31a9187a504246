//! # Payment Module
//!
//! The payment tagged union and the Payment Validator.
//!
//! ## Two Checkpoints
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Payment Validation Flow                             │
//! │                                                                         │
//! │  SaleRequest.payment                                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  PaymentRules::validate_intake()   ← before any transaction            │
//! │  ├── installment: provider known, months offered                       │
//! │  ├── hybrid: parts ≥ 0                                                 │
//! │  ├── booking: deposit ≥ 0, buyout ≥ 0                                  │
//! │  └── manual: label configured (case-insensitive)                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ... totals computed inside the transaction ...                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  PaymentRules::verify_settlement() ← against the FINAL total           │
//! │  ├── hybrid: |cash + card + transfer − total| ≤ 0.01                   │
//! │  └── delivery booking: |deposit + buyout − total| ≤ 0.01               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Mismatch → error → transaction rolls back                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{PaymentType, SaleType};
use crate::validation::validate_non_negative;

/// Slack allowed between payment parts and the sale total (one minor unit).
pub const PAYMENT_TOLERANCE: Money = Money::from_cents(1);

// =============================================================================
// Payment Details
// =============================================================================

/// How a sale is paid. Each variant carries only its own fields.
///
/// ## Wire Format
/// ```json
/// { "type": "cash" }
/// { "type": "installment", "provider": "МКК", "months": 6 }
/// { "type": "hybrid", "cash": 50000, "card": 30000, "transfer": 20000 }
/// { "type": "booking", "deposit": 20000, "buyout": 80000, "deadline": null }
/// { "type": "manual", "label": "Kaspi QR" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PaymentDetails {
    #[default]
    Cash,
    Installment {
        provider: String,
        months: u32,
    },
    Hybrid {
        cash: Money,
        card: Money,
        transfer: Money,
    },
    Booking {
        deposit: Money,
        buyout: Money,
        #[serde(default)]
        #[ts(as = "Option<String>")]
        deadline: Option<DateTime<Utc>>,
    },
    Manual {
        label: String,
    },
}

impl PaymentDetails {
    /// The discriminant, as stored in the `payment_type` column.
    pub fn payment_type(&self) -> PaymentType {
        match self {
            PaymentDetails::Cash => PaymentType::Cash,
            PaymentDetails::Installment { .. } => PaymentType::Installment,
            PaymentDetails::Hybrid { .. } => PaymentType::Hybrid,
            PaymentDetails::Booking { .. } => PaymentType::Booking,
            PaymentDetails::Manual { .. } => PaymentType::Manual,
        }
    }
}

// =============================================================================
// Payment Rules
// =============================================================================

/// Injected payment configuration: installment table and manual labels.
///
/// ## Example
/// ```rust
/// use vitrina_core::payment::{PaymentDetails, PaymentRules};
///
/// let rules = PaymentRules::default().with_manual_labels(["Kaspi QR", " ", "Гибрид"]);
/// assert_eq!(rules.manual_labels(), ["Kaspi QR"]);
///
/// let ok = PaymentDetails::Installment { provider: "МКК".into(), months: 9 };
/// assert!(rules.validate_intake(&ok).is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRules {
    installment_terms: BTreeMap<String, Vec<u32>>,
    manual_labels: Vec<String>,
}

impl Default for PaymentRules {
    fn default() -> Self {
        let installment_terms = [
            ("Зеро", vec![3, 8, 12]),
            ("МПЛБС", vec![3, 6]),
            ("Тумар", vec![3]),
            ("Мислам", vec![4]),
            ("МКК", vec![3, 6, 9]),
        ]
        .into_iter()
        .map(|(provider, months)| (provider.to_string(), months))
        .collect();

        PaymentRules {
            installment_terms,
            manual_labels: Vec::new(),
        }
    }
}

impl PaymentRules {
    /// Creates rules from an explicit provider table and label list.
    pub fn new(
        installment_terms: BTreeMap<String, Vec<u32>>,
        manual_labels: impl IntoIterator<Item = impl AsRef<str>>,
    ) -> Self {
        PaymentRules {
            installment_terms,
            manual_labels: normalize_manual_labels(manual_labels),
        }
    }

    /// Replaces the manual label allow-list (normalized).
    pub fn with_manual_labels(mut self, labels: impl IntoIterator<Item = impl AsRef<str>>) -> Self {
        self.manual_labels = normalize_manual_labels(labels);
        self
    }

    /// Allowed months for a provider, if the provider is known.
    pub fn installment_months(&self, provider: &str) -> Option<&[u32]> {
        self.installment_terms.get(provider).map(Vec::as_slice)
    }

    pub fn manual_labels(&self) -> &[String] {
        &self.manual_labels
    }

    /// Checks payment fields before any database work.
    ///
    /// ## Rules
    /// - installment: provider in table, months in the provider's set
    /// - hybrid: every part ≥ 0
    /// - booking: deposit ≥ 0 and buyout ≥ 0
    /// - manual: label non-empty and configured
    ///
    /// Returns the details with text fields trimmed.
    pub fn validate_intake(&self, payment: &PaymentDetails) -> CoreResult<PaymentDetails> {
        match payment {
            PaymentDetails::Cash => Ok(PaymentDetails::Cash),

            PaymentDetails::Installment { provider, months } => {
                let provider = provider.trim();
                if provider.is_empty() {
                    return Err(ValidationError::required("payment.provider").into());
                }
                let allowed = self
                    .installment_months(provider)
                    .ok_or_else(|| CoreError::UnknownInstallmentProvider(provider.to_string()))?;
                if !allowed.contains(months) {
                    return Err(CoreError::InvalidInstallmentTerm {
                        provider: provider.to_string(),
                        months: *months,
                        allowed: allowed.to_vec(),
                    });
                }
                Ok(PaymentDetails::Installment {
                    provider: provider.to_string(),
                    months: *months,
                })
            }

            PaymentDetails::Hybrid {
                cash,
                card,
                transfer,
            } => {
                validate_non_negative("payment.cash", *cash)?;
                validate_non_negative("payment.card", *card)?;
                validate_non_negative("payment.transfer", *transfer)?;
                Ok(payment.clone())
            }

            PaymentDetails::Booking {
                deposit, buyout, ..
            } => {
                validate_non_negative("payment.deposit", *deposit)?;
                validate_non_negative("payment.buyout", *buyout)?;
                Ok(payment.clone())
            }

            PaymentDetails::Manual { label } => {
                let label = label.trim();
                if label.is_empty() {
                    return Err(ValidationError::required("payment.label").into());
                }
                let lowered = label.to_lowercase();
                let configured = self
                    .manual_labels
                    .iter()
                    .find(|known| known.to_lowercase() == lowered)
                    .ok_or_else(|| CoreError::UnknownManualPayment(label.to_string()))?;
                Ok(PaymentDetails::Manual {
                    label: configured.clone(),
                })
            }
        }
    }

    /// Re-checks payment parts against the final sale total.
    ///
    /// Runs inside the sale transaction; an error here rolls back stock
    /// deductions made earlier in the same transaction.
    pub fn verify_settlement(
        &self,
        payment: &PaymentDetails,
        sale_type: SaleType,
        final_total: Money,
    ) -> CoreResult<()> {
        match payment {
            PaymentDetails::Hybrid {
                cash,
                card,
                transfer,
            } => {
                let paid = Money::checked_sum([*cash, *card, *transfer])
                    .ok_or_else(|| ValidationError::overflow("payment"))?;
                if !paid.within(final_total, PAYMENT_TOLERANCE) {
                    return Err(CoreError::HybridMismatch {
                        paid_cents: paid.cents(),
                        total_cents: final_total.cents(),
                    });
                }
                Ok(())
            }

            PaymentDetails::Booking {
                deposit, buyout, ..
            } if sale_type == SaleType::Delivery => {
                let paid = Money::checked_sum([*deposit, *buyout])
                    .ok_or_else(|| ValidationError::overflow("payment"))?;
                if !paid.within(final_total, PAYMENT_TOLERANCE) {
                    return Err(CoreError::BookingMismatch {
                        paid_cents: paid.cents(),
                        total_cents: final_total.cents(),
                    });
                }
                Ok(())
            }

            _ => Ok(()),
        }
    }
}

/// Normalizes a manual payment label list.
///
/// Trims, drops blanks and the reserved "hybrid"/"гибрид" names, and removes
/// case-insensitive duplicates keeping the first spelling.
pub fn normalize_manual_labels(labels: impl IntoIterator<Item = impl AsRef<str>>) -> Vec<String> {
    let mut seen = HashSet::new();
    labels
        .into_iter()
        .filter_map(|label| {
            let label = label.as_ref().trim();
            let lowered = label.to_lowercase();
            if label.is_empty() || lowered == "hybrid" || lowered == "гибрид" {
                return None;
            }
            seen.insert(lowered).then(|| label.to_string())
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
