//! # Ledger Repository
//!
//! Payment methods, bank accounts and the bank transactions sales post.
//!
//! A bank account's `balance_cents` is denormalized: every transaction
//! insert, amount change or delete is paired with a relative balance
//! adjustment on the same connection.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use hearth_core::{BankAccount, BankTransaction, Money, PaymentMethod};

const TRANSACTION_COLUMNS: &str = "id, tenant_id, bank_account_id, sale_id, \
     amount_cents AS amount, description, created_at, updated_at";

/// Repository for ledger database operations.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: SqlitePool,
}

impl LedgerRepository {
    /// Creates a new LedgerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        LedgerRepository { pool }
    }

    /// Opens a bank account.
    pub async fn create_account(
        &self,
        tenant_id: &str,
        name: &str,
        opening_balance: Money,
    ) -> DbResult<BankAccount> {
        let now = Utc::now();
        let account = BankAccount {
            id: Uuid::new_v4().to_string(),
            tenant_id: tenant_id.to_string(),
            name: name.to_string(),
            balance: opening_balance,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO bank_accounts (id, tenant_id, name, balance_cents, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&account.id)
        .bind(&account.tenant_id)
        .bind(&account.name)
        .bind(account.balance)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        debug!(id = %account.id, name = %account.name, "Bank account created");
        Ok(account)
    }

    /// Adds a payment method, optionally settling into a bank account.
    pub async fn create_payment_method(
        &self,
        tenant_id: &str,
        name: &str,
        bank_account_id: Option<&str>,
    ) -> DbResult<PaymentMethod> {
        let method = PaymentMethod {
            id: Uuid::new_v4().to_string(),
            tenant_id: tenant_id.to_string(),
            name: name.to_string(),
            bank_account_id: bank_account_id.map(str::to_string),
        };

        sqlx::query(
            "INSERT INTO payment_methods (id, tenant_id, name, bank_account_id) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&method.id)
        .bind(&method.tenant_id)
        .bind(&method.name)
        .bind(&method.bank_account_id)
        .execute(&self.pool)
        .await?;

        debug!(id = %method.id, name = %method.name, "Payment method created");
        Ok(method)
    }

    pub async fn get_account(&self, tenant_id: &str, id: &str) -> DbResult<Option<BankAccount>> {
        let account = sqlx::query_as::<_, BankAccount>(
            r#"
            SELECT id, tenant_id, name, balance_cents AS balance, updated_at
            FROM bank_accounts
            WHERE tenant_id = ?1 AND id = ?2
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(account)
    }

    /// Current balance of an account.
    ///
    /// ## Errors
    /// `DbError::NotFound` if the account is not in the tenant.
    pub async fn balance(&self, tenant_id: &str, id: &str) -> DbResult<Money> {
        self.get_account(tenant_id, id)
            .await?
            .map(|a| a.balance)
            .ok_or_else(|| DbError::not_found("Bank account", id))
    }

    /// The bank transaction a sale posted, if any.
    pub async fn sale_transaction(
        &self,
        tenant_id: &str,
        sale_id: &str,
    ) -> DbResult<Option<BankTransaction>> {
        let mut conn = self.pool.acquire().await?;
        Self::transaction_for_sale(&mut conn, tenant_id, sale_id).await
    }

    /// Every transaction posted to an account, oldest first.
    pub async fn transactions(
        &self,
        tenant_id: &str,
        bank_account_id: &str,
    ) -> DbResult<Vec<BankTransaction>> {
        let sql = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM bank_transactions \
             WHERE tenant_id = ?1 AND bank_account_id = ?2 ORDER BY created_at"
        );
        let transactions = sqlx::query_as::<_, BankTransaction>(&sql)
            .bind(tenant_id)
            .bind(bank_account_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(transactions)
    }

    // =========================================================================
    // Connection-level (engine)
    // =========================================================================

    pub(crate) async fn payment_method(
        conn: &mut SqliteConnection,
        tenant_id: &str,
        id: &str,
    ) -> DbResult<Option<PaymentMethod>> {
        let method = sqlx::query_as::<_, PaymentMethod>(
            "SELECT id, tenant_id, name, bank_account_id FROM payment_methods WHERE tenant_id = ?1 AND id = ?2",
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(method)
    }

    pub(crate) async fn transaction_for_sale(
        conn: &mut SqliteConnection,
        tenant_id: &str,
        sale_id: &str,
    ) -> DbResult<Option<BankTransaction>> {
        let sql = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM bank_transactions WHERE tenant_id = ?1 AND sale_id = ?2"
        );
        let transaction = sqlx::query_as::<_, BankTransaction>(&sql)
            .bind(tenant_id)
            .bind(sale_id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(transaction)
    }

    pub(crate) async fn insert_transaction(
        conn: &mut SqliteConnection,
        transaction: &BankTransaction,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO bank_transactions (
                id, tenant_id, bank_account_id, sale_id, amount_cents, description, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&transaction.id)
        .bind(&transaction.tenant_id)
        .bind(&transaction.bank_account_id)
        .bind(&transaction.sale_id)
        .bind(transaction.amount)
        .bind(&transaction.description)
        .bind(transaction.created_at)
        .bind(transaction.updated_at)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    pub(crate) async fn update_transaction_amount(
        conn: &mut SqliteConnection,
        id: &str,
        amount: Money,
        at: DateTime<Utc>,
    ) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE bank_transactions SET amount_cents = ?1, updated_at = ?2 WHERE id = ?3",
        )
        .bind(amount)
        .bind(at)
        .bind(id)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Bank transaction", id));
        }
        Ok(())
    }

    pub(crate) async fn delete_transaction(conn: &mut SqliteConnection, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM bank_transactions WHERE id = ?1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Bank transaction", id));
        }
        Ok(())
    }

    /// `balance_cents = balance_cents + delta`.
    pub(crate) async fn adjust_balance(
        conn: &mut SqliteConnection,
        tenant_id: &str,
        account_id: &str,
        delta: Money,
        at: DateTime<Utc>,
    ) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE bank_accounts SET balance_cents = balance_cents + ?1, updated_at = ?2 WHERE tenant_id = ?3 AND id = ?4",
        )
        .bind(delta)
        .bind(at)
        .bind(tenant_id)
        .bind(account_id)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Bank account", account_id));
        }

        debug!(account_id = %account_id, delta = %delta, "Balance adjusted");
        Ok(())
    }
}
