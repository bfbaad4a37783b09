use std::{env, path::PathBuf};

use anyhow::{Context, Result};

/// APIのURLが設定されていない場合のデフォルト値。
const DEFAULT_API_URL: &str = "http://localhost:4500/api";

/// 環境変数から読み込む設定。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub api_url: String,
    pub token_path: PathBuf,
}

impl Config {
    /// 環境変数から設定を読み込む。
    ///
    /// * `TIMELOG_API_URL` - APIのURL
    /// * `TIMELOG_TOKEN_PATH` - 認証トークンの保存先。未設定の場合は設定ディレクトリ配下を利用する。
    pub fn from_env() -> Result<Self> {
        let api_url = env::var("TIMELOG_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let token_path = match env::var_os("TIMELOG_TOKEN_PATH") {
            Some(path) => PathBuf::from(path),
            None => dirs::config_dir()
                .context("Failed to find the config directory")?
                .join("timelogs")
                .join("token"),
        };

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            token_path,
        })
    }
}
