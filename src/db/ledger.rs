//! Storage for per-user finance records: incomes, expenses, transactions, budgets
//! and savings goals.
//!
//! Reads and deletes are shared; inserts and partial updates are per table. Every
//! query is scoped by `user_id`, so another user's row looks exactly like a missing one.

use crate::db::models::{
    BudgetCreate, BudgetPatch, DbBudget, DbExpense, DbIncome, DbSavingsGoal, DbTransaction,
    ExpenseCreate, ExpensePatch, IncomeCreate, IncomePatch, SavingsGoalCreate, SavingsGoalPatch,
    TransactionCreate, TransactionPatch, Validate,
};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::FromRow;
use sqlx::mysql::{MySqlConnection, MySqlRow};
use std::future::Future;
use uuid::Uuid;

/// A table of records owned by a user.
pub trait Record: for<'r> FromRow<'r, MySqlRow> + Serialize + Send + Unpin + 'static {
    type Create: DeserializeOwned + Validate + Send + 'static;
    type Patch: DeserializeOwned + Validate + Send + 'static;

    const TABLE: &'static str;
    /// Route prefix, e.g. `/savings-goals`.
    const PATH: &'static str;
    /// Singular name used in error messages.
    const NAME: &'static str;

    /// Insert a row for `user_id` and return its id.
    fn insert(
        conn: &mut MySqlConnection,
        user_id: i64,
        input: Self::Create,
    ) -> impl Future<Output = Result<i64, sqlx::Error>> + Send;

    /// Apply the present fields of `patch` to the row, if `user_id` owns it.
    fn update(
        conn: &mut MySqlConnection,
        id: i64,
        user_id: i64,
        patch: Self::Patch,
    ) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
}

pub async fn list_owned<T: Record>(
    conn: &mut MySqlConnection,
    user_id: i64,
) -> Result<Vec<T>, sqlx::Error> {
    let sql = format!("SELECT * FROM {} WHERE user_id = ? ORDER BY id", T::TABLE);
    sqlx::query_as::<_, T>(&sql)
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await
}

pub async fn find_owned<T: Record>(
    conn: &mut MySqlConnection,
    id: i64,
    user_id: i64,
) -> Result<Option<T>, sqlx::Error> {
    let sql = format!("SELECT * FROM {} WHERE id = ? AND user_id = ?", T::TABLE);
    sqlx::query_as::<_, T>(&sql)
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await
}

/// Delete and return the row as it was before deletion.
pub async fn delete_owned<T: Record>(
    conn: &mut MySqlConnection,
    id: i64,
    user_id: i64,
) -> Result<Option<T>, sqlx::Error> {
    let Some(existing) = find_owned::<T>(conn, id, user_id).await? else {
        return Ok(None);
    };
    let sql = format!("DELETE FROM {} WHERE id = ? AND user_id = ?", T::TABLE);
    let result = sqlx::query(&sql)
        .bind(id)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    Ok((result.rows_affected() > 0).then_some(existing))
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn new_public_id() -> String {
    Uuid::new_v4().to_string()
}

impl Record for DbIncome {
    type Create = IncomeCreate;
    type Patch = IncomePatch;

    const TABLE: &'static str = "incomes";
    const PATH: &'static str = "/incomes";
    const NAME: &'static str = "Income";

    async fn insert(
        conn: &mut MySqlConnection,
        user_id: i64,
        input: IncomeCreate,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            r#"INSERT INTO incomes (public_id, user_id, amount, description, income_date)
               VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(new_public_id())
        .bind(user_id)
        .bind(input.amount)
        .bind(input.description)
        .bind(input.income_date.unwrap_or_else(today))
        .execute(&mut *conn)
        .await?;
        Ok(result.last_insert_id() as i64)
    }

    async fn update(
        conn: &mut MySqlConnection,
        id: i64,
        user_id: i64,
        patch: IncomePatch,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"UPDATE incomes SET
                amount = COALESCE(?, amount),
                description = COALESCE(?, description),
                income_date = COALESCE(?, income_date)
              WHERE id = ? AND user_id = ?"#,
        )
        .bind(patch.amount)
        .bind(patch.description)
        .bind(patch.income_date)
        .bind(id)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }
}

impl Record for DbExpense {
    type Create = ExpenseCreate;
    type Patch = ExpensePatch;

    const TABLE: &'static str = "expenses";
    const PATH: &'static str = "/expenses";
    const NAME: &'static str = "Expense";

    async fn insert(
        conn: &mut MySqlConnection,
        user_id: i64,
        input: ExpenseCreate,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            r#"INSERT INTO expenses (public_id, user_id, amount, category, description, expense_date)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(new_public_id())
        .bind(user_id)
        .bind(input.amount)
        .bind(input.category)
        .bind(input.description)
        .bind(input.expense_date.unwrap_or_else(today))
        .execute(&mut *conn)
        .await?;
        Ok(result.last_insert_id() as i64)
    }

    async fn update(
        conn: &mut MySqlConnection,
        id: i64,
        user_id: i64,
        patch: ExpensePatch,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"UPDATE expenses SET
                amount = COALESCE(?, amount),
                category = COALESCE(?, category),
                description = COALESCE(?, description),
                expense_date = COALESCE(?, expense_date)
              WHERE id = ? AND user_id = ?"#,
        )
        .bind(patch.amount)
        .bind(patch.category)
        .bind(patch.description)
        .bind(patch.expense_date)
        .bind(id)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }
}

impl Record for DbTransaction {
    type Create = TransactionCreate;
    type Patch = TransactionPatch;

    const TABLE: &'static str = "transactions";
    const PATH: &'static str = "/transactions";
    const NAME: &'static str = "Transaction";

    async fn insert(
        conn: &mut MySqlConnection,
        user_id: i64,
        input: TransactionCreate,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            r#"INSERT INTO transactions
                (public_id, user_id, kind, amount, description, transaction_date)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(new_public_id())
        .bind(user_id)
        .bind(input.kind.as_str())
        .bind(input.amount)
        .bind(input.description)
        .bind(input.transaction_date.unwrap_or_else(today))
        .execute(&mut *conn)
        .await?;
        Ok(result.last_insert_id() as i64)
    }

    async fn update(
        conn: &mut MySqlConnection,
        id: i64,
        user_id: i64,
        patch: TransactionPatch,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"UPDATE transactions SET
                kind = COALESCE(?, kind),
                amount = COALESCE(?, amount),
                description = COALESCE(?, description),
                transaction_date = COALESCE(?, transaction_date)
              WHERE id = ? AND user_id = ?"#,
        )
        .bind(patch.kind.map(|k| k.as_str()))
        .bind(patch.amount)
        .bind(patch.description)
        .bind(patch.transaction_date)
        .bind(id)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }
}

impl Record for DbBudget {
    type Create = BudgetCreate;
    type Patch = BudgetPatch;

    const TABLE: &'static str = "budgets";
    const PATH: &'static str = "/budgets";
    const NAME: &'static str = "Budget";

    async fn insert(
        conn: &mut MySqlConnection,
        user_id: i64,
        input: BudgetCreate,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            r#"INSERT INTO budgets
                (public_id, user_id, category, amount_limit, period_start, period_end)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(new_public_id())
        .bind(user_id)
        .bind(input.category)
        .bind(input.amount_limit)
        .bind(input.period_start)
        .bind(input.period_end)
        .execute(&mut *conn)
        .await?;
        Ok(result.last_insert_id() as i64)
    }

    async fn update(
        conn: &mut MySqlConnection,
        id: i64,
        user_id: i64,
        patch: BudgetPatch,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"UPDATE budgets SET
                category = COALESCE(?, category),
                amount_limit = COALESCE(?, amount_limit),
                period_start = COALESCE(?, period_start),
                period_end = COALESCE(?, period_end)
              WHERE id = ? AND user_id = ?"#,
        )
        .bind(patch.category)
        .bind(patch.amount_limit)
        .bind(patch.period_start)
        .bind(patch.period_end)
        .bind(id)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }
}

impl Record for DbSavingsGoal {
    type Create = SavingsGoalCreate;
    type Patch = SavingsGoalPatch;

    const TABLE: &'static str = "savings_goals";
    const PATH: &'static str = "/savings-goals";
    const NAME: &'static str = "Savings goal";

    async fn insert(
        conn: &mut MySqlConnection,
        user_id: i64,
        input: SavingsGoalCreate,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            r#"INSERT INTO savings_goals
                (public_id, user_id, name, target_amount, current_amount, target_date)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(new_public_id())
        .bind(user_id)
        .bind(input.name)
        .bind(input.target_amount)
        .bind(input.current_amount)
        .bind(input.target_date)
        .execute(&mut *conn)
        .await?;
        Ok(result.last_insert_id() as i64)
    }

    // `target_date` can be set but not cleared through a patch.
    async fn update(
        conn: &mut MySqlConnection,
        id: i64,
        user_id: i64,
        patch: SavingsGoalPatch,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"UPDATE savings_goals SET
                name = COALESCE(?, name),
                target_amount = COALESCE(?, target_amount),
                current_amount = COALESCE(?, current_amount),
                target_date = COALESCE(?, target_date)
              WHERE id = ? AND user_id = ?"#,
        )
        .bind(patch.name)
        .bind(patch.target_amount)
        .bind(patch.current_amount)
        .bind(patch.target_date)
        .bind(id)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }
}
