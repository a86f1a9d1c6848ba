use crate::domain;
use crate::domain::task::driving_ports::TaskError;
use crate::domain::task::{NewTask, Task, UpdateTask};
use crate::external_connections::{ConnectionHandle, ExternalConnectivity};
use anyhow::{Context, Error};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, query, query_as};
use tracing::warn;

/// Task listings are only ordered by completion. Rows with the same completion state come
/// back in whatever order PostgreSQL produces.
pub struct DbTaskReader;

#[derive(FromRow)]
struct TaskRow {
    id: i32,
    user_id: Option<i32>,
    title: String,
    description: Option<String>,
    complete: bool,
    create: DateTime<Utc>,
}

impl From<TaskRow> for domain::task::Task {
    fn from(value: TaskRow) -> Self {
        Task {
            id: value.id,
            owner_user_id: value.user_id,
            title: value.title,
            description: value.description,
            complete: value.complete,
            created_at: value.create,
        }
    }
}

impl domain::task::driven_ports::TaskReader for DbTaskReader {
    async fn all_tasks(&self, ext_cxn: &mut impl ExternalConnectivity) -> Result<Vec<Task>, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let tasks: Vec<Task> = query_as::<_, TaskRow>(
            r#"SELECT t.id, t.user_id, t.title, t.description, t.complete, t."create"
            FROM task t
            ORDER BY t.complete ASC"#,
        )
        .fetch_all(cxn.borrow_connection())
        .await
        .context("trying to fetch all tasks")?
        .into_iter()
        .map(Task::from)
        .collect();

        Ok(tasks)
    }

    async fn tasks_for_user(
        &self,
        user_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Vec<Task>, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let tasks: Vec<Task> = query_as::<_, TaskRow>(
            r#"SELECT t.id, t.user_id, t.title, t.description, t.complete, t."create"
            FROM task t
            WHERE t.user_id = $1
            ORDER BY t.complete ASC"#,
        )
        .bind(user_id)
        .fetch_all(cxn.borrow_connection())
        .await
        .context("trying to fetch tasks for a user")?
        .into_iter()
        .map(Task::from)
        .collect();

        Ok(tasks)
    }

    async fn task_by_id(
        &self,
        task_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<Task>, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let task = query_as::<_, TaskRow>(
            r#"SELECT t.id, t.user_id, t.title, t.description, t.complete, t."create"
            FROM task t
            WHERE t.id = $1"#,
        )
        .bind(task_id)
        .fetch_optional(cxn.borrow_connection())
        .await
        .context("trying to fetch a task by ID")?
        .map(Task::from);

        Ok(task)
    }
}

/// "create" is filled in by the column default on insert. No statement here writes it.
pub struct DbTaskWriter;

impl domain::task::driven_ports::TaskWriter for DbTaskWriter {
    async fn create_task(
        &self,
        new_task: &NewTask,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Task, TaskError> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let insert_result = query_as::<_, TaskRow>(
            r#"INSERT INTO task(user_id, title, description, complete)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, title, description, complete, "create""#,
        )
        .bind(new_task.owner_user_id)
        .bind(new_task.title.as_str())
        .bind(new_task.description.as_deref())
        .bind(new_task.complete)
        .fetch_one(cxn.borrow_connection())
        .await;

        match insert_result {
            Ok(created) => Ok(created.into()),
            // The owner was deleted after the service checked for them
            Err(sqlx::Error::Database(db_err)) if db_err.is_foreign_key_violation() => {
                warn!(owner = ?new_task.owner_user_id, "Task owner vanished before insert");
                Err(TaskError::UserDoesNotExist)
            }
            Err(other) => Err(Error::from(other)
                .context("trying to insert a new task into the database")
                .into()),
        }
    }

    async fn update_task(
        &self,
        task_id: i32,
        update: &UpdateTask,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<Task>, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let updated = query_as::<_, TaskRow>(
            r#"UPDATE task SET title = $1, description = $2, complete = $3
            WHERE id = $4
            RETURNING id, user_id, title, description, complete, "create""#,
        )
        .bind(update.title.as_str())
        .bind(update.description.as_deref())
        .bind(update.complete)
        .bind(task_id)
        .fetch_optional(cxn.borrow_connection())
        .await
        .context("trying to update a task in the database")?;

        Ok(updated.map(Task::from))
    }

    async fn set_task_completion(
        &self,
        task_id: i32,
        complete: bool,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<Task>, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let updated = query_as::<_, TaskRow>(
            r#"UPDATE task SET complete = $1
            WHERE id = $2
            RETURNING id, user_id, title, description, complete, "create""#,
        )
        .bind(complete)
        .bind(task_id)
        .fetch_optional(cxn.borrow_connection())
        .await
        .context("trying to set a task's completion in the database")?;

        Ok(updated.map(Task::from))
    }

    async fn delete_task(
        &self,
        task_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<bool, Error> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let deleted = query("DELETE FROM task WHERE id = $1")
            .bind(task_id)
            .execute(cxn.borrow_connection())
            .await
            .context("trying to remove a task from the database")?;

        Ok(deleted.rows_affected() > 0)
    }
}
