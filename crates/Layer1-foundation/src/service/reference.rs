//! Service Reference - 레지스트리에 등록된 서비스의 핸들

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// 서비스 ID 속성 키
pub const SERVICE_ID: &str = "service.id";

/// 서비스 랭킹 속성 키
pub const SERVICE_RANKING: &str = "service.ranking";

/// 서비스 인터페이스 목록 속성 키
pub const OBJECT_CLASS: &str = "objectClass";

// ============================================================================
// PropertyValue
// ============================================================================

/// 서비스 속성 값
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Long(i64),
    String(String),
    List(Vec<String>),
}

impl PropertyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            Self::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// 정렬용 비교 (같은 타입끼리는 값으로, 다른 타입은 문자열 표현으로)
    pub fn compare(&self, other: &PropertyValue) -> Ordering {
        match (self, other) {
            (Self::Long(a), Self::Long(b)) => a.cmp(b),
            (Self::String(a), Self::String(b)) => a.cmp(b),
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::List(a), Self::List(b)) => a.cmp(b),
            _ => self.to_string().cmp(&other.to_string()),
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{}", v),
            Self::Long(v) => write!(f, "{}", v),
            Self::String(v) => write!(f, "{}", v),
            Self::List(v) => write!(f, "[{}]", v.join(", ")),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        Self::Long(v)
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<Vec<String>> for PropertyValue {
    fn from(v: Vec<String>) -> Self {
        Self::List(v)
    }
}

/// 서비스 속성 맵
pub type Properties = BTreeMap<String, PropertyValue>;

/// 키를 대소문자 구분 없이 조회
pub fn lookup<'a>(properties: &'a Properties, key: &str) -> Option<&'a PropertyValue> {
    properties
        .get(key)
        .or_else(|| properties.iter().find(|(k, _)| k.eq_ignore_ascii_case(key)).map(|(_, v)| v))
}

// ============================================================================
// ServiceReference
// ============================================================================

/// 레지스트리 서비스 참조
///
/// 동일성(equality, hash)은 서비스 ID로만 정의된다. 속성이 바뀐 참조도
/// 같은 서비스를 가리키면 같은 값으로 취급된다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceReference {
    id: u64,
    properties: Arc<Properties>,
}

impl ServiceReference {
    pub fn new(id: u64, mut properties: Properties) -> Self {
        properties.insert(SERVICE_ID.to_string(), PropertyValue::Long(id as i64));
        Self {
            id,
            properties: Arc::new(properties),
        }
    }

    /// 서비스 ID
    pub fn id(&self) -> u64 {
        self.id
    }

    /// 서비스 랭킹 (없으면 0)
    pub fn ranking(&self) -> i64 {
        self.property(SERVICE_RANKING)
            .and_then(PropertyValue::as_long)
            .unwrap_or(0)
    }

    /// 속성 조회. `service.id`는 항상 존재한다.
    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        lookup(&self.properties, key)
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// 속성 맵 사본
    pub fn to_properties(&self) -> Properties {
        (*self.properties).clone()
    }

    /// 기본 순서: 랭킹 내림차순, 같은 랭킹은 ID 오름차순
    pub fn natural_order(a: &ServiceReference, b: &ServiceReference) -> Ordering {
        b.ranking().cmp(&a.ranking()).then(a.id.cmp(&b.id))
    }

    /// 속성 키 기반 비교자. 속성이 없는 참조는 뒤로 정렬된다.
    pub fn compare_by(
        key: impl Into<String>,
    ) -> impl Fn(&ServiceReference, &ServiceReference) -> Ordering + Send + Sync + 'static {
        let key = key.into();
        move |a, b| match (a.property(&key), b.property(&key)) {
            (Some(x), Some(y)) => x.compare(y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

impl PartialEq for ServiceReference {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ServiceReference {}

impl Hash for ServiceReference {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for ServiceReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceReference[id={}", self.id)?;
        if let Some(classes) = self.property(OBJECT_CLASS) {
            write!(f, ", {}={}", OBJECT_CLASS, classes)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(id: u64, ranking: i64) -> ServiceReference {
        let mut props = Properties::new();
        props.insert(SERVICE_RANKING.into(), ranking.into());
        ServiceReference::new(id, props)
    }

    #[test]
    fn test_equality_by_id_only() {
        let a = reference(1, 0);
        let b = reference(1, 10);
        assert_eq!(a, b);
        assert_ne!(a, reference(2, 0));
    }

    #[test]
    fn test_natural_order() {
        let mut refs = vec![reference(3, 0), reference(1, 0), reference(2, 5)];
        refs.sort_by(ServiceReference::natural_order);
        let ids: Vec<u64> = refs.iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }

    #[test]
    fn test_compare_by_missing_property_sorts_last() {
        let mut with_name = Properties::new();
        with_name.insert("name".into(), "b".into());
        let a = ServiceReference::new(1, with_name);
        let b = ServiceReference::new(2, Properties::new());

        let cmp = ServiceReference::compare_by("name");
        assert_eq!(cmp(&a, &b), Ordering::Less);
        assert_eq!(cmp(&b, &a), Ordering::Greater);
    }

    #[test]
    fn test_case_insensitive_lookup() {
        let mut props = Properties::new();
        props.insert("objectClass".into(), vec!["Greeter".to_string()].into());
        let r = ServiceReference::new(7, props);
        assert!(r.property("OBJECTCLASS").is_some());
        assert_eq!(r.to_properties().get(SERVICE_ID), Some(&PropertyValue::Long(7)));
    }
}
