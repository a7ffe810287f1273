//! # Ledger Synchronizer (planning)
//!
//! Decides what has to happen to a sale's bank transaction and the affected
//! account balances. Applying the plan is the database crate's job and always
//! happens inside the sale's own transaction.
//!
//! ## States
//! ```text
//! ┌──────────────────────┬────────────────────────┬───────────────────────────┐
//! │ previous transaction │ target account         │ plan                      │
//! ├──────────────────────┼────────────────────────┼───────────────────────────┤
//! │ none                 │ none                   │ Noop                      │
//! │ none                 │ A                      │ Create on A (+amount)     │
//! │ on A, amount x       │ A, amount x            │ Noop                      │
//! │ on A, amount x       │ A, amount y            │ Adjust (+(y − x) on A)    │
//! │ on A, amount x       │ B or none              │ Move: delete (−x on A),   │
//! │                      │                        │ create on B (+y on B)     │
//! └──────────────────────┴────────────────────────┴───────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::BankTransaction;

/// The parts of an existing bank transaction the planner needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedTransaction {
    pub id: String,
    pub bank_account_id: String,
    pub amount: Money,
}

impl From<&BankTransaction> for LinkedTransaction {
    fn from(tx: &BankTransaction) -> Self {
        LinkedTransaction {
            id: tx.id.clone(),
            bank_account_id: tx.bank_account_id.clone(),
            amount: tx.amount,
        }
    }
}

/// What to do with a sale's bank transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerPlan {
    /// Nothing to write.
    Noop,
    /// Insert a transaction and credit the account.
    Create { account_id: String, amount: Money },
    /// Same account, new amount: update in place, apply the difference.
    Adjust {
        transaction_id: String,
        account_id: String,
        previous: Money,
        amount: Money,
    },
    /// Account changed: delete the old transaction (debit its account), then
    /// create on the new account if there is one.
    Move {
        removed: LinkedTransaction,
        target: Option<(String, Money)>,
    },
}

impl LedgerPlan {
    pub fn is_noop(&self) -> bool {
        matches!(self, LedgerPlan::Noop)
    }

    /// Signed balance change per account implied by this plan.
    pub fn balance_changes(&self) -> Vec<(String, Money)> {
        match self {
            LedgerPlan::Noop => Vec::new(),
            LedgerPlan::Create { account_id, amount } => vec![(account_id.clone(), *amount)],
            LedgerPlan::Adjust {
                account_id,
                previous,
                amount,
                ..
            } => vec![(account_id.clone(), *amount - *previous)],
            LedgerPlan::Move { removed, target } => {
                let mut changes = vec![(removed.bank_account_id.clone(), -removed.amount)];
                if let Some((account_id, amount)) = target {
                    changes.push((account_id.clone(), *amount));
                }
                changes
            }
        }
    }
}

/// Plans the ledger change for a sale.
///
/// `target_account` is the bank account linked to the sale's payment method
/// after the operation, or `None` if the method has no account or the sale
/// is a quote.
///
/// ## Example
/// ```rust
/// use hearth_core::ledger::{plan, LedgerPlan};
/// use hearth_core::money::Money;
///
/// let p = plan(None, Some("acc-1"), Money::from_cents(10000));
/// assert!(matches!(p, LedgerPlan::Create { .. }));
/// assert!(plan(None, None, Money::from_cents(10000)).is_noop());
/// ```
pub fn plan(
    previous: Option<&LinkedTransaction>,
    target_account: Option<&str>,
    amount: Money,
) -> LedgerPlan {
    match (previous, target_account) {
        (None, None) => LedgerPlan::Noop,
        (None, Some(account)) => LedgerPlan::Create {
            account_id: account.to_string(),
            amount,
        },
        (Some(prev), Some(account)) if prev.bank_account_id == account => {
            if prev.amount == amount {
                LedgerPlan::Noop
            } else {
                LedgerPlan::Adjust {
                    transaction_id: prev.id.clone(),
                    account_id: account.to_string(),
                    previous: prev.amount,
                    amount,
                }
            }
        }
        (Some(prev), target) => LedgerPlan::Move {
            removed: prev.clone(),
            target: target.map(|account| (account.to_string(), amount)),
        },
    }
}
