//! Service Event - 레지스트리가 발행하는 서비스 변경 이벤트

use super::reference::ServiceReference;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 서비스 이벤트 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ServiceEventKind {
    /// 서비스 등록됨
    Registered,

    /// 서비스 속성 변경됨 (변경 후에도 필터와 일치)
    Modified,

    /// 서비스 속성 변경으로 더 이상 필터와 일치하지 않음
    ModifiedEndmatch,

    /// 서비스 등록 해제 중
    Unregistering,
}

impl fmt::Display for ServiceEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registered => write!(f, "REGISTERED"),
            Self::Modified => write!(f, "MODIFIED"),
            Self::ModifiedEndmatch => write!(f, "MODIFIED_ENDMATCH"),
            Self::Unregistering => write!(f, "UNREGISTERING"),
        }
    }
}

/// 서비스 이벤트
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceEvent {
    pub kind: ServiceEventKind,
    pub reference: ServiceReference,
}

impl ServiceEvent {
    pub fn new(kind: ServiceEventKind, reference: ServiceReference) -> Self {
        Self { kind, reference }
    }

    pub fn registered(reference: ServiceReference) -> Self {
        Self::new(ServiceEventKind::Registered, reference)
    }

    pub fn modified(reference: ServiceReference) -> Self {
        Self::new(ServiceEventKind::Modified, reference)
    }

    pub fn unregistering(reference: ServiceReference) -> Self {
        Self::new(ServiceEventKind::Unregistering, reference)
    }

    pub fn service_id(&self) -> u64 {
        self.reference.id()
    }
}

impl fmt::Display for ServiceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceEvent[{} {}]", self.kind, self.reference)
    }
}
