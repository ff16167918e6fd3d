//! Importer Config - 서비스 컬렉션 임포터 설정
//!
//! TOML 예시:
//!
//! ```toml
//! beanName = "greeters"
//! filter = "(objectClass=com.example.Greeter)"
//! mandatory = true
//! collection = "sortedList"
//! sortBy = "service.ranking"
//! proxies = false
//! ```

use crate::service::ServiceFilter;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

// ============================================================================
// CollectionKind
// ============================================================================

/// 내부 저장소 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CollectionKind {
    /// 삽입 순서, 중복 허용
    #[default]
    List,

    /// 삽입 순서, 같은 값은 한 번만
    Set,

    /// 정렬 순서, 중복 허용
    SortedList,

    /// 정렬 순서, 비교 결과가 같은 값은 한 번만
    SortedSet,
}

impl CollectionKind {
    pub fn is_sorted(&self) -> bool {
        matches!(self, Self::SortedList | Self::SortedSet)
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List => write!(f, "list"),
            Self::Set => write!(f, "set"),
            Self::SortedList => write!(f, "sortedList"),
            Self::SortedSet => write!(f, "sortedSet"),
        }
    }
}

// ============================================================================
// ImporterConfig
// ============================================================================

/// 서비스 컬렉션 임포터 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImporterConfig {
    /// 임포터 이름 (상태 이벤트와 로그에 사용)
    pub bean_name: String,

    /// LDAP 스타일 서비스 필터
    pub filter: String,

    /// 최소 한 개의 서비스가 필요한지 여부
    pub mandatory: bool,

    /// 저장소 종류
    pub collection: CollectionKind,

    /// 정렬 기준 속성 키 (없으면 랭킹/ID 기본 순서)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,

    /// 프록시 생성 여부 (false면 서비스 참조를 그대로 노출)
    pub proxies: bool,
}

impl Default for ImporterConfig {
    fn default() -> Self {
        Self {
            bean_name: "serviceCollection".to_string(),
            filter: "(objectClass=*)".to_string(),
            mandatory: true,
            collection: CollectionKind::List,
            sort_by: None,
            proxies: false,
        }
    }
}

impl ImporterConfig {
    pub fn new(bean_name: impl Into<String>, filter: impl Into<String>) -> Self {
        Self {
            bean_name: bean_name.into(),
            filter: filter.into(),
            ..Default::default()
        }
    }

    pub fn with_mandatory(mut self, mandatory: bool) -> Self {
        self.mandatory = mandatory;
        self
    }

    pub fn with_collection(mut self, collection: CollectionKind) -> Self {
        self.collection = collection;
        self
    }

    pub fn with_sort_by(mut self, key: impl Into<String>) -> Self {
        self.sort_by = Some(key.into());
        self
    }

    pub fn with_proxies(mut self, proxies: bool) -> Self {
        self.proxies = proxies;
        self
    }

    // ========================================================================
    // Load
    // ========================================================================

    /// TOML 문자열에서 로드 후 검증
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 로드
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// 설정 검증
    pub fn validate(&self) -> Result<()> {
        if self.bean_name.trim().is_empty() {
            return Err(Error::Config("beanName must not be empty".to_string()));
        }
        if self.sort_by.is_some() && !self.collection.is_sorted() {
            return Err(Error::Config(format!(
                "sortBy requires a sorted collection, got '{}'",
                self.collection
            )));
        }
        self.parsed_filter().map(|_| ())
    }

    /// 필터 파싱
    pub fn parsed_filter(&self) -> Result<ServiceFilter> {
        ServiceFilter::parse(&self.filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ImporterConfig::default();
        assert!(config.mandatory);
        assert_eq!(config.collection, CollectionKind::List);
        assert!(!config.proxies);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml() {
        let config = ImporterConfig::from_toml_str(
            r#"
            beanName = "greeters"
            filter = "(objectClass=Greeter)"
            mandatory = false
            collection = "sortedSet"
            sortBy = "name"
            "#,
        )
        .unwrap();

        assert_eq!(config.bean_name, "greeters");
        assert!(!config.mandatory);
        assert_eq!(config.collection, CollectionKind::SortedSet);
        assert_eq!(config.sort_by.as_deref(), Some("name"));
    }

    #[test]
    fn test_invalid_filter_rejected() {
        let err = ImporterConfig::from_toml_str(r#"filter = "objectClass=Greeter""#).unwrap_err();
        assert!(matches!(err, Error::InvalidFilter { .. }));
    }

    #[test]
    fn test_sort_by_requires_sorted_kind() {
        let config = ImporterConfig::new("x", "(a=b)").with_sort_by("name");
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "beanName = \"fromFile\"").unwrap();
        writeln!(file, "filter = \"(lang=en)\"").unwrap();

        let config = ImporterConfig::load(file.path()).unwrap();
        assert_eq!(config.bean_name, "fromFile");
        assert_eq!(config.parsed_filter().unwrap().as_str(), "(lang=en)");
    }
}
