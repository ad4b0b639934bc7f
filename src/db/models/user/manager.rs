//! Manager for the user model.
use super::{Manager as _, NewUser, User};
use crate::db::DatabaseConnection;
use async_trait::async_trait;
use chrono::Utc;

#[async_trait]
impl super::Manager for DatabaseConnection {
    /// Find a user by their API token.
    ///
    /// # Errors
    /// Errors if can't establish a connection to the database.
    async fn find_by_token(&self, token: &str) -> anyhow::Result<Option<User>> {
        let statement = "
            SELECT *
            FROM user
            WHERE token = $1
            LIMIT 1
        ";
        let row = sqlx::query_as::<_, User>(statement)
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Find a user by id.
    ///
    /// # Errors
    /// Errors if can't establish a connection to the database.
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<User>> {
        let statement = "
            SELECT *
            FROM user
            WHERE id = $1
        ";
        let row = sqlx::query_as::<_, User>(statement)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Insert a new user into the database.
    ///
    /// # Errors
    /// Errors if the username or token is already taken.
    async fn create(&self, user: &NewUser) -> anyhow::Result<User> {
        let statement = "
            INSERT INTO user ( username, role, token, created_at )
            VALUES ( $1, $2, $3, $4 )
        ";
        let id = sqlx::query(statement)
            .bind(&user.username)
            .bind(user.role)
            .bind(&user.token)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?
            .last_insert_rowid();
        self.find_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("user {id} vanished after insert"))
    }
}
