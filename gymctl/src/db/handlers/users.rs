//! Database repository for users.

use crate::db::{
    errors::Result,
    handlers::repository::Repository,
    models::users::{UserCreateDBRequest, UserDBResponse, UserUpdateDBRequest},
};
use crate::types::{abbrev_uuid, UserId};
use sqlx::PgConnection;
use std::collections::HashMap;
use tracing::instrument;
use uuid::Uuid;

/// Filter for listing users
#[derive(Debug, Clone)]
pub struct UserFilter {
    pub skip: i64,
    pub limit: i64,
}

impl UserFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit }
    }
}

pub struct Users<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Users<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Look up a user by username for login
    #[instrument(skip(self), err)]
    pub async fn get_user_by_username(&mut self, username: &str) -> Result<Option<UserDBResponse>> {
        let user = sqlx::query_as::<_, UserDBResponse>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(user)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Users<'c> {
    type CreateRequest = UserCreateDBRequest;
    type UpdateRequest = UserUpdateDBRequest;
    type Response = UserDBResponse;
    type Id = UserId;
    type Filter = UserFilter;

    #[instrument(skip(self, request), fields(username = %request.username), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let user_id = Uuid::new_v4();

        let user = sqlx::query_as::<_, UserDBResponse>(
            r#"
            INSERT INTO users (id, username, display_name, is_admin, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&request.username)
        .bind(&request.display_name)
        .bind(request.is_admin)
        .bind(&request.password_hash)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(user)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let user = sqlx::query_as::<_, UserDBResponse>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(user)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<Self::Id>) -> Result<HashMap<Self::Id, Self::Response>> {
        let users = sqlx::query_as::<_, UserDBResponse>("SELECT * FROM users WHERE id = ANY($1)")
            .bind(&ids)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(users.into_iter().map(|u| (u.id, u)).collect())
    }

    #[instrument(skip(self, filter), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let users = sqlx::query_as::<_, UserDBResponse>("SELECT * FROM users ORDER BY username OFFSET $1 LIMIT $2")
            .bind(filter.skip)
            .bind(filter.limit)
            .fetch_all(&mut *self.db)
            .await?;
        Ok(users)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let user = sqlx::query_as::<_, UserDBResponse>(
            r#"
            UPDATE users
            SET display_name = COALESCE($2, display_name),
                password_hash = COALESCE($3, password_hash),
                is_admin = COALESCE($4, is_admin),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.display_name)
        .bind(&request.password_hash)
        .bind(request.is_admin)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::errors::DbError;
    use sqlx::PgPool;

    fn create_request(username: &str) -> UserCreateDBRequest {
        UserCreateDBRequest {
            username: username.to_string(),
            display_name: Some("Test User".to_string()),
            is_admin: false,
            password_hash: None,
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_and_get_user(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);

        let created = repo.create(&create_request("alice")).await.unwrap();
        assert_eq!(created.username, "alice");
        assert!(!created.is_admin);

        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.username, "alice");

        let by_username = repo.get_user_by_username("alice").await.unwrap().unwrap();
        assert_eq!(by_username.id, created.id);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_duplicate_username_is_unique_violation(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);

        repo.create(&create_request("bob")).await.unwrap();
        let err = repo.create(&create_request("bob")).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_password_hash(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);

        let user = repo.create(&create_request("carol")).await.unwrap();
        let updated = repo
            .update(
                user.id,
                &UserUpdateDBRequest {
                    password_hash: Some("new-hash".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.password_hash.as_deref(), Some("new-hash"));
        // Unspecified fields are untouched
        assert_eq!(updated.display_name.as_deref(), Some("Test User"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete_user(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);

        let user = repo.create(&create_request("dave")).await.unwrap();
        assert!(repo.delete(user.id).await.unwrap());
        assert!(!repo.delete(user.id).await.unwrap());
        assert!(repo.get_by_id(user.id).await.unwrap().is_none());
    }
}
