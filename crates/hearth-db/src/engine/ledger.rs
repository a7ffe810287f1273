//! Executes a [`LedgerPlan`] inside the write transaction.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use crate::repository::ledger::LedgerRepository;
use hearth_core::ledger::LedgerPlan;
use hearth_core::{BankTransaction, Money};

pub(super) async fn apply(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    sale_id: &str,
    plan: &LedgerPlan,
    at: DateTime<Utc>,
) -> DbResult<()> {
    match plan {
        LedgerPlan::Noop => {}

        LedgerPlan::Create { account_id, amount } => {
            post(conn, tenant_id, sale_id, account_id, *amount, at).await?;
        }

        LedgerPlan::Adjust {
            transaction_id,
            account_id,
            previous,
            amount,
        } => {
            LedgerRepository::update_transaction_amount(conn, transaction_id, *amount, at).await?;
            LedgerRepository::adjust_balance(conn, tenant_id, account_id, *amount - *previous, at)
                .await?;
            debug!(sale_id, account_id = %account_id, amount = %amount, "Bank transaction adjusted");
        }

        LedgerPlan::Move { removed, target } => {
            LedgerRepository::delete_transaction(conn, &removed.id).await?;
            LedgerRepository::adjust_balance(
                conn,
                tenant_id,
                &removed.bank_account_id,
                -removed.amount,
                at,
            )
            .await?;
            debug!(sale_id, account_id = %removed.bank_account_id, "Bank transaction removed");

            if let Some((account_id, amount)) = target {
                post(conn, tenant_id, sale_id, account_id, *amount, at).await?;
            }
        }
    }
    Ok(())
}

/// Inserts a transaction and credits the account.
async fn post(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    sale_id: &str,
    account_id: &str,
    amount: Money,
    at: DateTime<Utc>,
) -> DbResult<()> {
    let transaction = BankTransaction {
        id: Uuid::new_v4().to_string(),
        tenant_id: tenant_id.to_string(),
        bank_account_id: account_id.to_string(),
        sale_id: sale_id.to_string(),
        amount,
        description: format!("Sale {sale_id}"),
        created_at: at,
        updated_at: at,
    };

    LedgerRepository::insert_transaction(conn, &transaction).await?;
    LedgerRepository::adjust_balance(conn, tenant_id, account_id, amount, at).await?;

    debug!(sale_id, account_id = %account_id, amount = %amount, "Bank transaction posted");
    Ok(())
}
