use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    auth,
    domain::{Account, AccountRole, CreateAccountRequest},
    error::{AppError, Result},
    repository::AccountRepository,
};

#[derive(FromRow)]
struct AccountRow {
    id: String,
    email: String,
    full_name: String,
    role: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqliteAccountRepository {
    pool: SqlitePool,
}

impl SqliteAccountRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_account(row: AccountRow) -> Result<Account> {
        Ok(Account {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            email: row.email,
            full_name: row.full_name,
            role: Self::parse_role(&row.role)?,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }

    fn parse_role(s: &str) -> Result<AccountRole> {
        match s {
            "Tutor" => Ok(AccountRole::Tutor),
            "Tutee" => Ok(AccountRole::Tutee),
            _ => Err(AppError::Database(format!("Invalid account role: {}", s))),
        }
    }

    fn role_to_str(role: &AccountRole) -> &'static str {
        match role {
            AccountRole::Tutor => "Tutor",
            AccountRole::Tutee => "Tutee",
        }
    }
}

#[async_trait]
impl AccountRepository for SqliteAccountRepository {
    async fn create(&self, account: CreateAccountRequest) -> Result<Account> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let password_hash = auth::AuthService::hash_password(&account.password).await?;
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO accounts (id, email, full_name, password_hash, role, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id_str)
        .bind(&account.email)
        .bind(&account.full_name)
        .bind(&password_hash)
        .bind(Self::role_to_str(&account.role))
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created account".to_string())
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>> {
        let id_str = id.to_string();
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT id, email, full_name, role, created_at, updated_at
            FROM accounts
            WHERE id = ?
            "#,
        )
        .bind(id_str)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_account(r)?)),
            None => Ok(None),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT id, email, full_name, role, created_at, updated_at
            FROM accounts
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_account(r)?)),
            None => Ok(None),
        }
    }
}
