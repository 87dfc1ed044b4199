use crate::db::models::{DbUser, UserPatch};
use sqlx::mysql::MySqlConnection;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, public_id, username, email, password, created_at, updated_at";

/// Insert a user whose password is already hashed. Returns the new row id.
pub async fn insert(
    conn: &mut MySqlConnection,
    username: &str,
    email: &str,
    password_hash: &str,
) -> Result<i64, sqlx::Error> {
    let result =
        sqlx::query("INSERT INTO users (public_id, username, email, password) VALUES (?, ?, ?, ?)")
            .bind(Uuid::new_v4().to_string())
            .bind(username)
            .bind(email)
            .bind(password_hash)
            .execute(&mut *conn)
            .await?;
    Ok(result.last_insert_id() as i64)
}

pub async fn find_by_id(conn: &mut MySqlConnection, id: i64) -> Result<Option<DbUser>, sqlx::Error> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
    sqlx::query_as::<_, DbUser>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
}

/// Look a user up by either name or email, as the login form accepts both.
pub async fn find_by_login(
    conn: &mut MySqlConnection,
    username_or_email: &str,
) -> Result<Option<DbUser>, sqlx::Error> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ? OR email = ? LIMIT 1");
    sqlx::query_as::<_, DbUser>(&sql)
        .bind(username_or_email)
        .bind(username_or_email)
        .fetch_optional(&mut *conn)
        .await
}

/// Apply the present fields of `patch`. `password_hash` replaces `patch.password`.
///
/// MySQL reports zero affected rows when nothing changed, so callers re-read the row
/// to tell "unchanged" from "missing".
pub async fn update(
    conn: &mut MySqlConnection,
    id: i64,
    patch: &UserPatch,
    password_hash: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"UPDATE users SET
            username = COALESCE(?, username),
            email = COALESCE(?, email),
            password = COALESCE(?, password)
          WHERE id = ?"#,
    )
    .bind(patch.username.as_deref())
    .bind(patch.email.as_deref())
    .bind(password_hash)
    .bind(id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Delete a user and return the row as it was, or `None` when it did not exist.
pub async fn delete(conn: &mut MySqlConnection, id: i64) -> Result<Option<DbUser>, sqlx::Error> {
    let Some(existing) = find_by_id(conn, id).await? else {
        return Ok(None);
    };
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok((result.rows_affected() > 0).then_some(existing))
}
