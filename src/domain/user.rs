use crate::domain::user::driving_ports::{CreateUserError, DeleteUserError};
use crate::external_connections::ExternalConnectivity;
use anyhow::Context;
use thiserror::Error;
use tracing::error;

/// A user who can own tasks
#[derive(PartialEq, Eq, Debug)]
#[cfg_attr(test, derive(Clone))]
pub struct TodoUser {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
}

#[cfg_attr(test, derive(Clone, Debug))]
pub struct CreateUser {
    pub first_name: String,
    pub last_name: String,
}

pub mod driven_ports {
    use super::*;

    pub trait UserReader {
        async fn get_all(
            &self,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Vec<TodoUser>, anyhow::Error>;
    }

    pub trait UserWriter {
        /// Stores a user and returns their ID. Storage has the final say on duplicate names, so
        /// this fails with [CreateUserError::UserAlreadyExists] if another user with the same
        /// name was stored first.
        async fn create_user(
            &self,
            user: &CreateUser,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<i32, CreateUserError>;

        /// Removes a user, returning false if there was no user to remove. Storage is
        /// responsible for removing the tasks the user owned along with it.
        async fn delete_user(
            &self,
            id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<bool, anyhow::Error>;
    }

    pub struct UserDescription<'names> {
        pub first_name: &'names str,
        pub last_name: &'names str,
    }

    pub trait DetectUser {
        async fn user_exists(
            &self,
            user_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<bool, anyhow::Error>;

        async fn user_with_name_exists<'strings>(
            &self,
            description: UserDescription<'strings>,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<bool, anyhow::Error>;
    }
}

pub mod driving_ports {
    use super::*;

    #[derive(Debug, Error)]
    pub enum CreateUserError {
        #[error("The provided user already exists.")]
        UserAlreadyExists,
        #[error(transparent)]
        PortError(#[from] anyhow::Error),
    }

    #[derive(Debug, Error)]
    pub enum DeleteUserError {
        #[error("The specified user did not exist.")]
        UserDoesNotExist,
        #[error(transparent)]
        PortError(#[from] anyhow::Error),
    }


    pub trait UserPort {
        async fn get_users(
            &self,
            ext_cxn: &mut impl ExternalConnectivity,
            u_reader: &impl driven_ports::UserReader,
        ) -> Result<Vec<TodoUser>, anyhow::Error>;
        async fn create_user(
            &self,
            new_user: &CreateUser,
            ext_cxn: &mut impl ExternalConnectivity,
            u_writer: &impl driven_ports::UserWriter,
            u_detect: &impl driven_ports::DetectUser,
        ) -> Result<i32, CreateUserError>;
        async fn delete_user(
            &self,
            user_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
            u_writer: &impl driven_ports::UserWriter,
        ) -> Result<(), DeleteUserError>;
    }
}

pub struct UserService;

#[derive(Debug, Error)]
pub(super) enum UserExistsErr {
    #[error("user with ID {0} does not exist")]
    UserDoesNotExist(i32),

    #[error(transparent)]
    PortError(#[from] anyhow::Error),
}

pub(super) async fn verify_user_exists(
    id: i32,
    ext_cxn: &mut impl ExternalConnectivity,
    user_detect: &impl driven_ports::DetectUser,
) -> Result<(), UserExistsErr> {
    let does_user_exist = user_detect.user_exists(id, ext_cxn).await?;

    if does_user_exist {
        Ok(())
    } else {
        Err(UserExistsErr::UserDoesNotExist(id))
    }
}

impl driving_ports::UserPort for UserService {
    async fn get_users(
        &self,
        ext_cxn: &mut impl ExternalConnectivity,
        u_reader: &impl driven_ports::UserReader,
    ) -> Result<Vec<TodoUser>, anyhow::Error> {
        let all_users_result = u_reader.get_all(ext_cxn).await;
        if let Err(ref port_err) = all_users_result {
            error!("User fetch failure: {port_err}");
        }

        all_users_result.context("Failed fetching users")
    }

    async fn create_user(
        &self,
        new_user: &CreateUser,
        ext_cxn: &mut impl ExternalConnectivity,
        u_writer: &impl driven_ports::UserWriter,
        u_detect: &impl driven_ports::DetectUser,
    ) -> Result<i32, CreateUserError> {
        let description = driven_ports::UserDescription {
            first_name: &new_user.first_name,
            last_name: &new_user.last_name,
        };

        let user_exists = u_detect
            .user_with_name_exists(description, &mut *ext_cxn)
            .await
            .context("Looking up user during creation")?;
        if user_exists {
            return Err(CreateUserError::UserAlreadyExists);
        }

        u_writer.create_user(new_user, &mut *ext_cxn).await
    }

    async fn delete_user(
        &self,
        user_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
        u_writer: &impl driven_ports::UserWriter,
    ) -> Result<(), DeleteUserError> {
        let removed = u_writer
            .delete_user(user_id, ext_cxn)
            .await
            .context("Deleting a user")?;

        if removed {
            Ok(())
        } else {
            Err(DeleteUserError::UserDoesNotExist)
        }
    }
}
