use std::{fs, path::PathBuf};

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Deserializer};

use crate::datetime;

/// ユーザー個別に付与された権限。
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPermissions {
    #[serde(default)]
    pub front_permissions: Vec<String>,
}

/// 認証トークンから取り出したログインユーザーの情報。
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub userid: String,
    pub role: String,
    #[serde(default)]
    pub permissions: UserPermissions,
    #[serde(deserialize_with = "deserialize_expiry")]
    pub expiry_timestamp: DateTime<Utc>,
}

/// ログイン中のセッション。
///
/// 画面にはこの値を明示的に渡す。
#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    pub token: String,
    pub user: AuthUser,
}

impl Session {
    /// トークンをデコードしてセッションを作成する。
    pub fn from_token(token: &str) -> Result<Self> {
        let user = decode_token(token)?;

        Ok(Self {
            token: token.to_string(),
            user,
        })
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.user.expiry_timestamp < now
    }
}

/// JWTのペイロードをデコードする。
///
/// 署名の検証はサーバー側で行うため、ここではペイロードの読み取りのみを行う。
pub fn decode_token(token: &str) -> Result<AuthUser> {
    let mut segments = token.trim().split('.');
    let payload = match (segments.next(), segments.next(), segments.next()) {
        (Some(_), Some(payload), Some(_)) => payload,
        _ => bail!("Token is not a JWT"),
    };
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .context("Failed to decode token payload")?;
    let user = serde_json::from_slice::<AuthUser>(&bytes)
        .context("Failed to deserialize token payload")?;

    Ok(user)
}

/// 有効期限を、RFC 3339の文字列またはエポック秒からデシリアライズする。
fn deserialize_expiry<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Expiry {
        Seconds(i64),
        Text(String),
    }

    match Expiry::deserialize(deserializer)? {
        Expiry::Seconds(seconds) => DateTime::from_timestamp(seconds, 0).ok_or_else(|| {
            serde::de::Error::custom(format!("Invalid expiry timestamp: {}", seconds))
        }),
        Expiry::Text(text) => DateTime::parse_from_rfc3339(&text)
            .map(|datetime| datetime.to_utc())
            .map_err(serde::de::Error::custom),
    }
}

/// 認証トークンをファイルに保存する。
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// 新しい`SessionStore`を返す。
    ///
    /// # Arguments
    ///
    /// * `path` - 認証トークンの保存先
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// 保存されているトークンを読み込む。保存されていない場合は`None`を返す。
    pub fn load_token(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let token = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read token from {}", self.path.display()))?;
        let token = token.trim();

        Ok((!token.is_empty()).then(|| token.to_string()))
    }

    /// トークンを保存する。デコードできないトークンは保存しない。
    pub fn save_token(&self, token: &str) -> Result<Session> {
        let session = Session::from_token(token).context("Refusing to save an invalid token")?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        fs::write(&self.path, &session.token)
            .with_context(|| format!("Failed to write token to {}", self.path.display()))?;
        info!("Logged in as {}", session.user.userid);

        Ok(session)
    }

    /// 保存されているトークンを削除する。
    pub fn logout(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .with_context(|| format!("Failed to remove token at {}", self.path.display()))?;
        }
        info!("Logged out");

        Ok(())
    }

    /// 保存されているトークンからセッションを復元する。
    ///
    /// トークンが無い場合は`None`を返す。期限切れの場合はログアウトして`None`を返す。
    pub fn bootstrap(&self) -> Result<Option<Session>> {
        let token = match self.load_token()? {
            Some(token) => token,
            None => {
                debug!("No token stored at {}", self.path.display());
                return Ok(None);
            }
        };
        let session = Session::from_token(&token)?;
        if session.is_expired(datetime::now()) {
            info!("Token expired at {}", session.user.expiry_timestamp);
            self.logout()?;
            return Ok(None);
        }

        Ok(Some(session))
    }
}
