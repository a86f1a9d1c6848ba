use crate::domain;
use crate::domain::user::driven_ports::UserDescription;
use crate::domain::user::driving_ports::CreateUserError;
use crate::domain::user::{CreateUser, TodoUser};
use crate::external_connections::{ConnectionHandle, ExternalConnectivity};
use anyhow::{Context, Error};
use sqlx::{FromRow, query, query_as, query_scalar};

pub struct DbDetectUser;

impl domain::user::driven_ports::DetectUser for DbDetectUser {
    async fn user_exists(
        &self,
        user_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<bool, Error> {
        let mut connection = ext_cxn.database_cxn().await?;

        let user_with_id_count =
            query_scalar::<_, i64>("SELECT count(*) FROM todo_user tu WHERE tu.id = $1")
                .bind(user_id)
                .fetch_one(connection.borrow_connection())
                .await
                .context("Detecting user with ID")?;

        Ok(user_with_id_count > 0)
    }

    async fn user_with_name_exists<'strings>(
        &self,
        description: UserDescription<'strings>,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<bool, Error> {
        let mut connection = ext_cxn.database_cxn().await?;

        let user_with_name_count = query_scalar::<_, i64>(
            "SELECT count(*) FROM todo_user tu WHERE tu.first_name = $1 AND tu.last_name = $2",
        )
        .bind(description.first_name)
        .bind(description.last_name)
        .fetch_one(connection.borrow_connection())
        .await
        .context("Detecting user via name")?;

        Ok(user_with_name_count > 0)
    }
}

pub struct DbReadUsers;

#[derive(FromRow)]
struct TodoUserRow {
    id: i32,
    first_name: String,
    last_name: String,
}

impl From<TodoUserRow> for TodoUser {
    fn from(value: TodoUserRow) -> Self {
        TodoUser {
            id: value.id,
            first_name: value.first_name,
            last_name: value.last_name,
        }
    }
}

impl domain::user::driven_ports::UserReader for DbReadUsers {
    async fn get_all(&self, ext_cxn: &mut impl ExternalConnectivity) -> Result<Vec<TodoUser>, Error> {
        let mut connection = ext_cxn.database_cxn().await?;

        let users: Vec<TodoUser> = query_as::<_, TodoUserRow>(
            "SELECT tu.id, tu.first_name, tu.last_name FROM todo_user tu ORDER BY tu.id",
        )
        .fetch_all(connection.borrow_connection())
        .await
        .context("Fetching all users")?
        .into_iter()
        .map(TodoUser::from)
        .collect();

        Ok(users)
    }
}

/// Deleting a user relies on the `ON DELETE CASCADE` foreign key on `task.user_id`
/// to remove the tasks they owned.
pub struct DbWriteUsers;

impl domain::user::driven_ports::UserWriter for DbWriteUsers {
    async fn create_user(
        &self,
        user: &CreateUser,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<i32, CreateUserError> {
        let mut cxn_handle = ext_cxn.database_cxn().await?;

        let insert_result = query_scalar::<_, i32>(
            "INSERT INTO todo_user(first_name, last_name) VALUES ($1, $2) RETURNING todo_user.id",
        )
        .bind(user.first_name.as_str())
        .bind(user.last_name.as_str())
        .fetch_one(cxn_handle.borrow_connection())
        .await;

        match insert_result {
            Ok(new_id) => Ok(new_id),
            // todo_user_full_name_key
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(CreateUserError::UserAlreadyExists)
            }
            Err(other) => Err(Error::from(other).context("Inserting new user").into()),
        }
    }

    async fn delete_user(
        &self,
        id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<bool, Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await?;

        let deleted = query("DELETE FROM todo_user WHERE id = $1")
            .bind(id)
            .execute(cxn_handle.borrow_connection())
            .await
            .context("Deleting a user")?;

        Ok(deleted.rows_affected() > 0)
    }
}
