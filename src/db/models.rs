use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Input checks that serde cannot express.
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}

#[derive(Debug, Clone, Serialize, PartialEq, FromRow)]
pub struct DbUser {
    pub id: i64,
    pub public_id: String,
    pub username: String,
    pub email: String,
    /// sha256 hex digest; never sent to clients.
    #[serde(skip_serializing)]
    pub password: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserCreate {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username_or_email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, FromRow)]
pub struct DbIncome {
    pub id: i64,
    pub public_id: String,
    pub user_id: i64,
    pub amount: Decimal,
    pub description: String,
    pub income_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IncomeCreate {
    pub amount: Decimal,
    #[serde(default)]
    pub description: String,
    /// Defaults to today (UTC).
    pub income_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IncomePatch {
    pub amount: Option<Decimal>,
    pub description: Option<String>,
    pub income_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, PartialEq, FromRow)]
pub struct DbExpense {
    pub id: i64,
    pub public_id: String,
    pub user_id: i64,
    pub amount: Decimal,
    pub category: String,
    pub description: String,
    pub expense_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExpenseCreate {
    pub amount: Decimal,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    pub expense_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExpensePatch {
    pub amount: Option<Decimal>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub expense_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, FromRow)]
pub struct DbTransaction {
    pub id: i64,
    pub public_id: String,
    pub user_id: i64,
    /// `income` or `expense`
    pub kind: String,
    pub amount: Decimal,
    pub description: String,
    pub transaction_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionCreate {
    pub kind: TransactionKind,
    pub amount: Decimal,
    #[serde(default)]
    pub description: String,
    pub transaction_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionPatch {
    pub kind: Option<TransactionKind>,
    pub amount: Option<Decimal>,
    pub description: Option<String>,
    pub transaction_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, PartialEq, FromRow)]
pub struct DbBudget {
    pub id: i64,
    pub public_id: String,
    pub user_id: i64,
    pub category: String,
    pub amount_limit: Decimal,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BudgetCreate {
    pub category: String,
    pub amount_limit: Decimal,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BudgetPatch {
    pub category: Option<String>,
    pub amount_limit: Option<Decimal>,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, PartialEq, FromRow)]
pub struct DbSavingsGoal {
    pub id: i64,
    pub public_id: String,
    pub user_id: i64,
    pub name: String,
    pub target_amount: Decimal,
    pub current_amount: Decimal,
    pub target_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SavingsGoalCreate {
    pub name: String,
    pub target_amount: Decimal,
    #[serde(default)]
    pub current_amount: Decimal,
    pub target_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SavingsGoalPatch {
    pub name: Option<String>,
    pub target_amount: Option<Decimal>,
    pub current_amount: Option<Decimal>,
    pub target_date: Option<NaiveDate>,
}

/// Money columns are `DECIMAL(12,2)`.
const MONEY_SCALE: u32 = 2;
const MONEY_INTEGER_DIGITS: u32 = 10;

/// A non-negative amount that fits the money columns without rounding.
fn money(field: &str, amount: Option<Decimal>) -> Result<(), String> {
    let Some(a) = amount else {
        return Ok(());
    };
    if a.is_sign_negative() && !a.is_zero() {
        return Err(format!("`{field}` must not be negative"));
    }
    if a.normalize().scale() > MONEY_SCALE {
        return Err(format!(
            "`{field}` must have at most {MONEY_SCALE} decimal places"
        ));
    }
    if a.abs() >= Decimal::from(10_i64.pow(MONEY_INTEGER_DIGITS)) {
        return Err(format!(
            "`{field}` must be less than 10^{MONEY_INTEGER_DIGITS}"
        ));
    }
    Ok(())
}

fn non_blank(field: &str, value: Option<&str>) -> Result<(), String> {
    match value {
        Some(v) if v.trim().is_empty() => Err(format!("`{field}` must not be empty")),
        _ => Ok(()),
    }
}

fn email_like(value: Option<&str>) -> Result<(), String> {
    match value {
        Some(v) => match v.split_once('@') {
            Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
            _ => Err("`email` must be a valid email address".to_string()),
        },
        None => Ok(()),
    }
}

impl Validate for UserCreate {
    fn validate(&self) -> Result<(), String> {
        non_blank("username", Some(&self.username))?;
        non_blank("password", Some(&self.password))?;
        email_like(Some(&self.email))
    }
}

impl Validate for UserPatch {
    fn validate(&self) -> Result<(), String> {
        non_blank("username", self.username.as_deref())?;
        non_blank("password", self.password.as_deref())?;
        email_like(self.email.as_deref())
    }
}

impl Validate for IncomeCreate {
    fn validate(&self) -> Result<(), String> {
        money("amount", Some(self.amount))
    }
}

impl Validate for IncomePatch {
    fn validate(&self) -> Result<(), String> {
        money("amount", self.amount)
    }
}

impl Validate for ExpenseCreate {
    fn validate(&self) -> Result<(), String> {
        money("amount", Some(self.amount))
    }
}

impl Validate for ExpensePatch {
    fn validate(&self) -> Result<(), String> {
        money("amount", self.amount)
    }
}

impl Validate for TransactionCreate {
    fn validate(&self) -> Result<(), String> {
        money("amount", Some(self.amount))
    }
}

impl Validate for TransactionPatch {
    fn validate(&self) -> Result<(), String> {
        money("amount", self.amount)
    }
}

impl Validate for BudgetCreate {
    fn validate(&self) -> Result<(), String> {
        non_blank("category", Some(&self.category))?;
        money("amount_limit", Some(self.amount_limit))?;
        if self.period_end < self.period_start {
            return Err("`period_end` must not be before `period_start`".to_string());
        }
        Ok(())
    }
}

impl Validate for BudgetPatch {
    // A one-sided period change is checked by the table constraint instead.
    fn validate(&self) -> Result<(), String> {
        non_blank("category", self.category.as_deref())?;
        money("amount_limit", self.amount_limit)?;
        if let (Some(start), Some(end)) = (self.period_start, self.period_end)
            && end < start
        {
            return Err("`period_end` must not be before `period_start`".to_string());
        }
        Ok(())
    }
}

impl Validate for SavingsGoalCreate {
    fn validate(&self) -> Result<(), String> {
        non_blank("name", Some(&self.name))?;
        money("target_amount", Some(self.target_amount))?;
        money("current_amount", Some(self.current_amount))
    }
}

impl Validate for SavingsGoalPatch {
    fn validate(&self) -> Result<(), String> {
        non_blank("name", self.name.as_deref())?;
        money("target_amount", self.target_amount)?;
        money("current_amount", self.current_amount)
    }
}
