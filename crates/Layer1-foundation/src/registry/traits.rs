//! Registry Traits - 서비스 레지스트리 경계 인터페이스

use crate::service::{ServiceEvent, ServiceFilter};
use crate::Result;
use std::sync::Arc;

// ============================================================================
// ListenerId
// ============================================================================

/// 서비스 리스너 등록 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ListenerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

// ============================================================================
// ServiceListener
// ============================================================================

/// 서비스 변경 이벤트 수신자
///
/// 레지스트리는 이벤트를 발생시킨 스레드에서 직접 호출하며, 여러 스레드에서
/// 동시에, 순서 보장 없이 호출될 수 있다. 구현체는 panic이나 에러를
/// 레지스트리 쪽으로 전파하지 않아야 한다.
pub trait ServiceListener: Send + Sync {
    /// 리스너 이름 (디버깅용)
    fn name(&self) -> &str {
        "service-listener"
    }

    /// 이벤트 처리
    fn service_changed(&self, event: &ServiceEvent);
}

// ============================================================================
// ServiceRegistry
// ============================================================================

/// 서비스 레지스트리 (이벤트 소스)
pub trait ServiceRegistry: Send + Sync {
    /// 필터와 일치하는 서비스 이벤트를 받도록 리스너 등록
    fn add_service_listener(
        &self,
        listener: Arc<dyn ServiceListener>,
        filter: ServiceFilter,
    ) -> Result<ListenerId>;

    /// 리스너 해제. 등록되어 있었으면 true
    fn remove_service_listener(&self, id: ListenerId) -> bool;
}
