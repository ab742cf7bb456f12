//! イメージ参照

use super::service::ServiceName;
use crate::error::{FlowError, Result};
use std::fmt;

/// 既定のイメージタグ
pub const DEFAULT_TAG: &str = "latest";

/// `{namespace}/{service}:{tag}` 形式のイメージ参照
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    namespace: String,
    service: ServiceName,
    tag: String,
}

impl ImageRef {
    pub fn new(namespace: &str, service: &ServiceName, tag: &str) -> Self {
        Self {
            namespace: namespace.trim_end_matches('/').to_string(),
            service: service.clone(),
            tag: tag.to_string(),
        }
    }

    /// タグなしのリポジトリ名（例: `mudam5/log-collector`）
    pub fn repository(&self) -> String {
        format!("{}/{}", self.namespace, self.service)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn service(&self) -> &ServiceName {
        &self.service
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}:{}", self.namespace, self.service, self.tag)
    }
}

/// タグのバリデーション
///
/// Docker タグの制約:
/// - 128文字以下
/// - 英数字、ピリオド、ハイフン、アンダースコアのみ
/// - 先頭はピリオドまたはハイフンではない
pub fn validate_tag(tag: &str) -> Result<()> {
    if tag.is_empty() {
        return Err(FlowError::InvalidTag("(empty)".to_string()));
    }

    if tag.len() > 128 {
        return Err(FlowError::InvalidTag(format!(
            "Tag too long ({} characters, max 128)",
            tag.len()
        )));
    }

    if tag.starts_with('.') || tag.starts_with('-') {
        return Err(FlowError::InvalidTag(tag.to_string()));
    }

    if let Some(c) = tag
        .chars()
        .find(|c| !c.is_ascii_alphanumeric() && *c != '.' && *c != '-' && *c != '_')
    {
        return Err(FlowError::InvalidTag(format!(
            "Invalid character '{}' in tag: {}",
            c, tag
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DEFAULT_SERVICES, ServiceList};

    #[test]
    fn test_image_ref_format() {
        let service = ServiceName::new("log-collector").unwrap();
        let image = ImageRef::new("mudam5", &service, "latest");
        assert_eq!(image.to_string(), "mudam5/log-collector:latest");
        assert_eq!(image.repository(), "mudam5/log-collector");
        assert_eq!(image.tag(), "latest");
    }

    #[test]
    fn test_image_ref_trims_namespace_slash() {
        let service = ServiceName::new("api").unwrap();
        let image = ImageRef::new("ghcr.io/org/", &service, "v1");
        assert_eq!(image.to_string(), "ghcr.io/org/api:v1");
    }

    #[test]
    fn test_every_default_service_tagged_latest() {
        for (service, expected) in ServiceList::defaults().iter().zip(DEFAULT_SERVICES) {
            let image = ImageRef::new("mudam5", service, DEFAULT_TAG);
            assert_eq!(image.to_string(), format!("mudam5/{}:latest", expected));
        }
    }

    #[test]
    fn test_validate_tag() {
        assert!(validate_tag("latest").is_ok());
        assert!(validate_tag("v1.2.3-rc_1").is_ok());
        assert!(validate_tag("").is_err());
        assert!(validate_tag(".hidden").is_err());
        assert!(validate_tag("-dash").is_err());
        assert!(validate_tag("feature/x").is_err());
        assert!(validate_tag(&"a".repeat(129)).is_err());
        assert!(validate_tag(&"a".repeat(128)).is_ok());
    }
}
