use crate::domain;
use crate::domain::task::driven_ports::{TaskReader, TaskWriter};
use crate::domain::task::driving_ports::TaskError;
use crate::external_connections::ExternalConnectivity;
use anyhow::Context;
use chrono::{DateTime, Utc};
use derive_more::Display;
use tracing::{info, warn};
use validator::Validate;

/// A single to-do item. Displays as its title.
#[derive(PartialEq, Eq, Debug, Display)]
#[display("{title}")]
#[cfg_attr(test, derive(Clone))]
pub struct Task {
    pub id: i32,
    /// Tasks may exist without an owner. When the owner is deleted, so is the task.
    pub owner_user_id: Option<i32>,
    pub title: String,
    pub description: Option<String>,
    pub complete: bool,
    /// Assigned by storage when the task is inserted and never changed afterwards
    pub created_at: DateTime<Utc>,
}

#[derive(Validate, Default)]
#[cfg_attr(test, derive(Clone, Debug))]
pub struct NewTask {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub description: Option<String>,
    pub complete: bool,
    pub owner_user_id: Option<i32>,
}

/// Replaces the editable fields of a task. Ownership and creation time can't be changed.
#[derive(Validate)]
#[cfg_attr(test, derive(Clone, Debug))]
pub struct UpdateTask {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub description: Option<String>,
    pub complete: bool,
}

/// Puts incomplete tasks ahead of complete ones. The sort is stable, so whatever order storage
/// returned within each group is left alone.
fn order_by_completion(tasks: &mut [Task]) {
    tasks.sort_by_key(|task| task.complete);
}

pub mod driven_ports {
    use super::*;

    pub trait TaskReader {
        async fn all_tasks(
            &self,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Vec<Task>, anyhow::Error>;
        async fn tasks_for_user(
            &self,
            user_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Vec<Task>, anyhow::Error>;
        async fn task_by_id(
            &self,
            task_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<Task>, anyhow::Error>;
    }

    pub trait TaskWriter {
        /// Stores a task, returning it with its ID and creation time filled in. Fails with
        /// [TaskError::UserDoesNotExist] if the owner is gone by the time the task is stored.
        async fn create_task(
            &self,
            new_task: &NewTask,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Task, TaskError>;

        /// Returns the updated task, or None if there was no task with the given ID
        async fn update_task(
            &self,
            task_id: i32,
            update: &UpdateTask,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<Task>, anyhow::Error>;

        async fn set_task_completion(
            &self,
            task_id: i32,
            complete: bool,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<Task>, anyhow::Error>;

        /// Returns false if there was no task with the given ID
        async fn delete_task(
            &self,
            task_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<bool, anyhow::Error>;
    }
}

pub mod driving_ports {
    use super::*;
    use thiserror::Error;
    use validator::ValidationErrors;

    #[derive(Debug, Error)]
    pub enum TaskError {
        #[error("The specified user did not exist.")]
        UserDoesNotExist,
        #[error("The specified task did not exist.")]
        TaskDoesNotExist,
        #[error("The task was invalid: {0}")]
        Invalid(#[from] ValidationErrors),
        #[error(transparent)]
        PortError(#[from] anyhow::Error),
    }

    impl From<domain::user::UserExistsErr> for TaskError {
        fn from(value: domain::user::UserExistsErr) -> Self {
            match value {
                domain::user::UserExistsErr::UserDoesNotExist(user_id) => {
                    warn!("User {user_id} doesn't exist, can't work with their tasks.");
                    TaskError::UserDoesNotExist
                }
                domain::user::UserExistsErr::PortError(err) => {
                    TaskError::from(err.context("Looking up task owner"))
                }
            }
        }
    }


    pub trait TaskPort {
        async fn list_tasks(
            &self,
            ext_cxn: &mut impl ExternalConnectivity,
            task_read: &impl driven_ports::TaskReader,
        ) -> Result<Vec<Task>, TaskError>;
        async fn tasks_for_user(
            &self,
            user_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
            u_detect: &impl domain::user::driven_ports::DetectUser,
            task_read: &impl driven_ports::TaskReader,
        ) -> Result<Vec<Task>, TaskError>;
        async fn task_by_id(
            &self,
            task_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
            task_read: &impl driven_ports::TaskReader,
        ) -> Result<Option<Task>, TaskError>;
        async fn create_task(
            &self,
            task: &NewTask,
            ext_cxn: &mut impl ExternalConnectivity,
            u_detect: &impl domain::user::driven_ports::DetectUser,
            task_write: &impl driven_ports::TaskWriter,
        ) -> Result<Task, TaskError>;
        async fn update_task(
            &self,
            task_id: i32,
            update: &UpdateTask,
            ext_cxn: &mut impl ExternalConnectivity,
            task_write: &impl driven_ports::TaskWriter,
        ) -> Result<Task, TaskError>;
        async fn set_task_completion(
            &self,
            task_id: i32,
            complete: bool,
            ext_cxn: &mut impl ExternalConnectivity,
            task_write: &impl driven_ports::TaskWriter,
        ) -> Result<Task, TaskError>;
        async fn delete_task(
            &self,
            task_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
            task_write: &impl driven_ports::TaskWriter,
        ) -> Result<(), TaskError>;
    }
}

pub struct TaskService;

impl driving_ports::TaskPort for TaskService {
    async fn list_tasks(
        &self,
        ext_cxn: &mut impl ExternalConnectivity,
        task_read: &impl TaskReader,
    ) -> Result<Vec<Task>, TaskError> {
        let mut tasks = task_read
            .all_tasks(ext_cxn)
            .await
            .context("listing all tasks")?;
        order_by_completion(&mut tasks);

        Ok(tasks)
    }

    async fn tasks_for_user(
        &self,
        user_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
        u_detect: &impl domain::user::driven_ports::DetectUser,
        task_read: &impl TaskReader,
    ) -> Result<Vec<Task>, TaskError> {
        domain::user::verify_user_exists(user_id, &mut *ext_cxn, u_detect).await?;
        let mut tasks = task_read
            .tasks_for_user(user_id, &mut *ext_cxn)
            .await
            .context("listing a user's tasks")?;
        order_by_completion(&mut tasks);

        Ok(tasks)
    }

    async fn task_by_id(
        &self,
        task_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
        task_read: &impl TaskReader,
    ) -> Result<Option<Task>, TaskError> {
        let task = task_read
            .task_by_id(task_id, ext_cxn)
            .await
            .context("fetching a task by ID")?;

        Ok(task)
    }

    async fn create_task(
        &self,
        task: &NewTask,
        ext_cxn: &mut impl ExternalConnectivity,
        u_detect: &impl domain::user::driven_ports::DetectUser,
        task_write: &impl TaskWriter,
    ) -> Result<Task, TaskError> {
        task.validate()?;
        if let Some(owner_id) = task.owner_user_id {
            domain::user::verify_user_exists(owner_id, &mut *ext_cxn, u_detect).await?;
        }

        let created_task = task_write.create_task(task, &mut *ext_cxn).await?;
        info!(task_id = created_task.id, "Created task \"{created_task}\"");

        Ok(created_task)
    }

    async fn update_task(
        &self,
        task_id: i32,
        update: &UpdateTask,
        ext_cxn: &mut impl ExternalConnectivity,
        task_write: &impl TaskWriter,
    ) -> Result<Task, TaskError> {
        update.validate()?;

        task_write
            .update_task(task_id, update, ext_cxn)
            .await
            .context("updating a task")?
            .ok_or(TaskError::TaskDoesNotExist)
    }

    async fn set_task_completion(
        &self,
        task_id: i32,
        complete: bool,
        ext_cxn: &mut impl ExternalConnectivity,
        task_write: &impl TaskWriter,
    ) -> Result<Task, TaskError> {
        task_write
            .set_task_completion(task_id, complete, ext_cxn)
            .await
            .context("marking task completion")?
            .ok_or(TaskError::TaskDoesNotExist)
    }

    async fn delete_task(
        &self,
        task_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
        task_write: &impl TaskWriter,
    ) -> Result<(), TaskError> {
        let removed = task_write
            .delete_task(task_id, ext_cxn)
            .await
            .context("deleting a task")?;

        if removed {
            Ok(())
        } else {
            Err(TaskError::TaskDoesNotExist)
        }
    }
}
