use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::Subcommand;
use log::info;

use crate::datetime::parse_date;
use crate::timelog_api::TimelogRepository;
use crate::user_management::{build_rows, UserTableRow};
use crate::user_profile::UserStatus;

/// `users`サブコマンドの引数を表す構造体。
#[derive(Debug, clap::Args)]
pub struct UsersArgs {
    #[clap(subcommand)]
    pub action: UsersAction,
}

/// ユーザー管理の操作。
#[derive(Debug, Subcommand)]
pub enum UsersAction {
    /// Lists all users.
    List,
    /// Pauses an active user.
    Pause {
        user_id: String,
        #[clap(
            long = "until",
            help = "Sets the reactivation date in the format YYYY-MM-DD",
            parse(try_from_str = parse_date),
        )]
        until: Option<NaiveDate>,
    },
    /// Resumes a paused user.
    Resume { user_id: String },
    /// Deletes a user.
    Delete { user_id: String },
}

pub struct UsersCommand<'a, T: TimelogRepository> {
    repository: &'a T,
}

impl<'a, T: TimelogRepository> UsersCommand<'a, T> {
    /// 新しい`UsersCommand`を返す。
    pub fn new(repository: &'a T) -> Self {
        Self { repository }
    }

    /// `users`サブコマンドの処理を行い、処理後のユーザー一覧を返す。
    pub async fn run(&self, args: UsersArgs) -> Result<Vec<UserTableRow>> {
        match args.action {
            UsersAction::List => {}
            UsersAction::Pause { user_id, until } => {
                self.change_status(&user_id, UserStatus::InActive, until).await?;
            }
            UsersAction::Resume { user_id } => {
                self.change_status(&user_id, UserStatus::Active, None).await?;
            }
            UsersAction::Delete { user_id } => {
                self.repository.delete_user(&user_id).await?;
                info!("Deleted user {}", user_id);
            }
        }

        self.read_rows().await
    }

    async fn read_rows(&self) -> Result<Vec<UserTableRow>> {
        let users = self
            .repository
            .read_user_profiles()
            .await
            .context("Failed to retrieve users")?;
        info!("Users retrieved successfully.");

        Ok(build_rows(users))
    }

    /// 一時停止、再開を行う。一覧のボタンと同じく、現在の状態と逆の状態にのみ変更できる。
    async fn change_status(
        &self,
        user_id: &str,
        status: UserStatus,
        reactivation_date: Option<NaiveDate>,
    ) -> Result<()> {
        let row = self
            .read_rows()
            .await?
            .into_iter()
            .find(|row| row.user.id == user_id)
            .with_context(|| format!("User not found: {}", user_id))?;
        if row.pause_resume_target() != status {
            bail!("User {} is already {}", user_id, status);
        }

        info!("Changing status of {} to {}", row.user.full_name(), status);
        self.repository
            .update_user_status(user_id, status, reactivation_date)
            .await?;

        Ok(())
    }
}
