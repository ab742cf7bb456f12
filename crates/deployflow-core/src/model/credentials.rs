//! レジストリ認証情報

use crate::error::{FlowError, Result};
use std::fmt;

/// ユーザー名を読む環境変数
pub const USERNAME_ENV: &str = "DEPLOYFLOW_REGISTRY_USERNAME";
/// パスワードを読む環境変数
pub const PASSWORD_ENV: &str = "DEPLOYFLOW_REGISTRY_PASSWORD";

/// 表示時に伏せ字になる秘密値
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// 実際の値（ログイン処理の stdin に渡すときだけ使う）
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(****)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

/// ユーザー名とパスワードの組
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: Secret,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Result<Self> {
        let username = username.into();
        let password = password.into();

        if username.trim().is_empty() {
            return Err(FlowError::InvalidConfig(
                "レジストリのユーザー名が空です".to_string(),
            ));
        }
        if password.is_empty() {
            return Err(FlowError::InvalidConfig(
                "レジストリのパスワードが空です".to_string(),
            ));
        }

        Ok(Self {
            username,
            password: Secret::new(password),
        })
    }

    /// 環境変数から読み込む
    ///
    /// どちらも未設定なら `Ok(None)`、片方だけ設定されている場合はエラー。
    pub fn from_env() -> Result<Option<Self>> {
        let username = std::env::var(USERNAME_ENV).ok();
        let password = std::env::var(PASSWORD_ENV).ok();

        match (username, password) {
            (None, None) => Ok(None),
            (Some(username), Some(password)) => Self::new(username, password).map(Some),
            (Some(_), None) => Err(FlowError::InvalidConfig(format!(
                "{} が設定されていますが {} がありません",
                USERNAME_ENV, PASSWORD_ENV
            ))),
            (None, Some(_)) => Err(FlowError::InvalidConfig(format!(
                "{} が設定されていますが {} がありません",
                PASSWORD_ENV, USERNAME_ENV
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_secret_is_redacted() {
        let creds = Credentials::new("deployer", "hunter2").unwrap();
        assert_eq!(creds.password.to_string(), "****");
        assert!(!format!("{:?}", creds).contains("hunter2"));
        assert_eq!(creds.password.expose(), "hunter2");
    }

    #[test]
    fn test_empty_values_rejected() {
        assert!(Credentials::new("", "pw").is_err());
        assert!(Credentials::new("user", "").is_err());
    }

    #[test]
    #[serial]
    fn test_from_env_both_set() {
        temp_env::with_vars(
            [(USERNAME_ENV, Some("deployer")), (PASSWORD_ENV, Some("s3cret"))],
            || {
                let creds = Credentials::from_env().unwrap().unwrap();
                assert_eq!(creds.username, "deployer");
                assert_eq!(creds.password.expose(), "s3cret");
            },
        );
    }

    #[test]
    #[serial]
    fn test_from_env_unset() {
        temp_env::with_vars_unset([USERNAME_ENV, PASSWORD_ENV], || {
            assert!(Credentials::from_env().unwrap().is_none());
        });
    }

    #[test]
    #[serial]
    fn test_from_env_partial() {
        temp_env::with_vars(
            [(USERNAME_ENV, Some("deployer")), (PASSWORD_ENV, None::<&str>)],
            || {
                assert!(Credentials::from_env().is_err());
            },
        );
    }
}
