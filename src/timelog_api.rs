use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
#[cfg(test)]
use mockall::automock;
use log::{debug, info};
use reqwest::{header::AUTHORIZATION, header::CONTENT_TYPE, Client, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};

use crate::config::Config;
use crate::datetime::DateRange;
use crate::permissions::Role;
use crate::project::{Task, UserProject};
use crate::time_entry::TimeEntry;
use crate::user_profile::{UserProfile, UserStatus};

/// timelog APIから情報を取得、更新するためのtrait。
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TimelogRepository: Send + Sync {
    /// 指定した期間のtime entryを取得する。
    ///
    /// # Arguments
    ///
    /// * `user_id` - 対象のユーザー
    /// * `from` - 期間の開始日
    /// * `to` - 期間の終了日(この日を含む)
    async fn read_time_entries(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<TimeEntry>>;

    /// `offset`週前の週のtime entryを取得する。
    async fn read_week_time_entries(&self, user_id: &str, offset: u32) -> Result<Vec<TimeEntry>>;

    async fn read_user_profile(&self, user_id: &str) -> Result<UserProfile>;

    async fn update_user_profile(&self, profile: &UserProfile) -> Result<()>;

    /// ユーザー管理画面用に全ユーザーのプロフィールを取得する。
    async fn read_user_profiles(&self) -> Result<Vec<UserProfile>>;

    /// ユーザーを一時停止、または再開する。
    async fn update_user_status(
        &self,
        user_id: &str,
        status: UserStatus,
        reactivation_date: Option<NaiveDate>,
    ) -> Result<()>;

    async fn delete_user(&self, user_id: &str) -> Result<()>;

    async fn read_user_projects(&self, user_id: &str) -> Result<Vec<UserProject>>;

    async fn read_roles(&self) -> Result<Vec<Role>>;

    async fn read_user_tasks(&self, user_id: &str) -> Result<Vec<Task>>;
}

/// ステータス変更のリクエストボディ。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UserStatusRequest {
    status: UserStatus,
    reactivation_date: Option<NaiveDate>,
}

/// timelog APIと通信するためのクライアント。
///
/// # Examples
///
/// ```ignore
/// let client = TimelogClient::new(&config, &session.token);
/// let time_entries = client.read_week_time_entries("user", 0).await.unwrap();
/// ```
pub struct TimelogClient {
    client: Client,
    api_url: String,
    token: String,
}

impl TimelogClient {
    /// 新しい`TimelogClient`を返す。
    ///
    /// # Arguments
    ///
    /// * `config` - APIのURLを含む設定
    /// * `token` - `Authorization`ヘッダーに設定する認証トークン
    pub fn new(config: &Config, token: &str) -> Self {
        Self::with_api_url(&config.api_url, token)
    }

    fn with_api_url(api_url: &str, token: &str) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(AUTHORIZATION, &self.token)
            .header(CONTENT_TYPE, "application/json")
    }

    /// リクエストを送信し、レスポンスをデシリアライズする。
    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let value = self
            .authorized(request)
            .send()
            .await
            .with_context(|| format!("Failed to send request to timelog API at {}", self.api_url))?
            .error_for_status()
            .context("Request returned an error status")?
            .json::<T>()
            .await
            .context("Failed to deserialize response")?;

        Ok(value)
    }

    /// レスポンスボディを利用しないリクエストを送信する。
    async fn send(&self, request: RequestBuilder) -> Result<()> {
        self.authorized(request)
            .send()
            .await
            .with_context(|| format!("Failed to send request to timelog API at {}", self.api_url))?
            .error_for_status()
            .context("Request returned an error status")?;

        Ok(())
    }
}

#[async_trait]
impl TimelogRepository for TimelogClient {
    async fn read_time_entries(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<TimeEntry>> {
        let url = format!(
            "{}/TimeEntry/user/{}/{}/{}",
            self.api_url,
            user_id,
            from.format("%Y-%m-%d"),
            to.format("%Y-%m-%d")
        );
        let time_entries: Vec<TimeEntry> = self
            .fetch(self.client.get(url))
            .await
            .with_context(|| format!("Failed to read time entries from {} to {}", from, to))?;
        info!("length of time entries: {}", time_entries.len());

        Ok(time_entries)
    }

    async fn read_week_time_entries(&self, user_id: &str, offset: u32) -> Result<Vec<TimeEntry>> {
        let week = DateRange::for_week(offset);
        debug!("Week {}: {}", offset, week);

        self.read_time_entries(user_id, week.start, week.end).await
    }

    async fn read_user_profile(&self, user_id: &str) -> Result<UserProfile> {
        let url = format!("{}/userprofile/{}", self.api_url, user_id);

        self.fetch(self.client.get(url))
            .await
            .with_context(|| format!("Failed to read user profile of {}", user_id))
    }

    async fn update_user_profile(&self, profile: &UserProfile) -> Result<()> {
        let url = format!("{}/userprofile/{}", self.api_url, profile.id);

        self.send(self.client.put(url).json(profile))
            .await
            .with_context(|| format!("Failed to update user profile of {}", profile.id))
    }

    async fn read_user_profiles(&self) -> Result<Vec<UserProfile>> {
        let url = format!("{}/userprofile", self.api_url);

        self.fetch(self.client.get(url))
            .await
            .context("Failed to read user profiles")
    }

    async fn update_user_status(
        &self,
        user_id: &str,
        status: UserStatus,
        reactivation_date: Option<NaiveDate>,
    ) -> Result<()> {
        let url = format!("{}/userprofile/{}", self.api_url, user_id);
        let body = UserStatusRequest {
            status,
            reactivation_date,
        };
        debug!("Updating status of {} to {}", user_id, status);

        self.send(self.client.patch(url).json(&body))
            .await
            .with_context(|| format!("Failed to change status of {} to {}", user_id, status))
    }

    async fn delete_user(&self, user_id: &str) -> Result<()> {
        let url = format!("{}/userprofile/{}", self.api_url, user_id);

        self.send(self.client.delete(url))
            .await
            .with_context(|| format!("Failed to delete user {}", user_id))
    }

    async fn read_user_projects(&self, user_id: &str) -> Result<Vec<UserProject>> {
        let url = format!("{}/projects/user/{}", self.api_url, user_id);

        self.fetch(self.client.get(url))
            .await
            .with_context(|| format!("Failed to read projects of {}", user_id))
    }

    async fn read_roles(&self) -> Result<Vec<Role>> {
        let url = format!("{}/roles", self.api_url);

        self.fetch(self.client.get(url)).await.context("Failed to read roles")
    }

    async fn read_user_tasks(&self, user_id: &str) -> Result<Vec<Task>> {
        let url = format!("{}/tasks/user/{}", self.api_url, user_id);

        self.fetch(self.client.get(url))
            .await
            .with_context(|| format!("Failed to read tasks of {}", user_id))
    }
}
