//! サービス定義

use crate::error::{FlowError, Result};
use regex::Regex;
use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

/// デプロイ対象サービスの既定リスト（宣言順にビルド・プッシュ・書き換えされる）
pub const DEFAULT_SERVICES: [&str; 6] = [
    "log-collector",
    "persistor-auth",
    "persistor-payment",
    "persistor-system",
    "persistor-application",
    "log-ui",
];

static SERVICE_NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9_.-]*$").expect("service name pattern"));

/// サービス名
///
/// ビルドコンテキストのディレクトリ名とイメージ名の両方に使われるため、
/// Docker のリポジトリ名として有効な文字だけを許可します。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceName(String);

impl ServiceName {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.len() > 128 || !SERVICE_NAME_PATTERN.is_match(&name) {
            return Err(FlowError::InvalidServiceName(name));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ServiceName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// 順序付きのサービスリスト
///
/// ビルド・プッシュ・マニフェスト書き換えの全ステージがこの1つの値を参照します。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceList(Vec<ServiceName>);

impl ServiceList {
    /// 名前の並びからリストを作成（空・重複・不正な名前はエラー）
    pub fn new<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut services = Vec::new();

        for name in names {
            let service = ServiceName::new(name)?;
            if !seen.insert(service.clone()) {
                return Err(FlowError::DuplicateService(service.0));
            }
            services.push(service);
        }

        if services.is_empty() {
            return Err(FlowError::InvalidConfig(
                "services が空です。少なくとも1つのサービスが必要です".to_string(),
            ));
        }

        Ok(Self(services))
    }

    /// 既定の6サービス
    pub fn defaults() -> Self {
        Self(
            DEFAULT_SERVICES
                .iter()
                .map(|name| ServiceName((*name).to_string()))
                .collect(),
        )
    }

    /// 指定されたサービスだけに絞り込む
    ///
    /// 順序は元のリストの宣言順を維持します。
    pub fn select(&self, only: &[String]) -> Result<Self> {
        if only.is_empty() {
            return Ok(self.clone());
        }

        if let Some(unknown) = only.iter().find(|name| !self.contains(name)) {
            return Err(FlowError::ServiceNotFound(format!(
                "{} (利用可能なサービス: {})",
                unknown,
                self.names().join(", ")
            )));
        }

        Ok(Self(
            self.0
                .iter()
                .filter(|service| only.iter().any(|name| name == service.as_str()))
                .cloned()
                .collect(),
        ))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|service| service.as_str() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(ServiceName::as_str).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ServiceName> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[ServiceName] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for ServiceList {
    fn default() -> Self {
        Self::defaults()
    }
}

impl<'a> IntoIterator for &'a ServiceList {
    type Item = &'a ServiceName;
    type IntoIter = std::slice::Iter<'a, ServiceName>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
