//! In-memory Service Registry - 프로세스 내부 서비스 레지스트리
//!
//! 테스트와 CLI 재현(replay)에 쓰이는 레퍼런스 레지스트리. 이벤트는 호출한
//! 스레드에서 동기적으로 전달되며, 전달 중에는 레지스트리 락을 잡지 않는다.

use super::traits::{ListenerId, ServiceListener, ServiceRegistry};
use crate::service::{Properties, ServiceEvent, ServiceEventKind, ServiceFilter, ServiceReference};
use crate::{Error, Result};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

/// 등록된 리스너 정보
struct RegisteredListener {
    listener: Arc<dyn ServiceListener>,
    filter: ServiceFilter,
}

/// 프로세스 내부 서비스 레지스트리
pub struct InMemoryServiceRegistry {
    /// 등록된 서비스 (id → 참조)
    services: RwLock<BTreeMap<u64, ServiceReference>>,

    /// 등록된 리스너
    listeners: RwLock<HashMap<ListenerId, RegisteredListener>>,

    /// 서비스 ID 카운터 (1부터 시작)
    service_counter: AtomicU64,

    /// 리스너 ID 카운터
    listener_counter: AtomicU64,

    /// 전달된 이벤트 수
    event_count: AtomicU64,
}

impl InMemoryServiceRegistry {
    pub fn new() -> Self {
        Self {
            services: RwLock::new(BTreeMap::new()),
            listeners: RwLock::new(HashMap::new()),
            service_counter: AtomicU64::new(1),
            listener_counter: AtomicU64::new(0),
            event_count: AtomicU64::new(0),
        }
    }

    // ========================================================================
    // 등록 / 변경 / 해제
    // ========================================================================

    /// 서비스 등록. 필터가 일치하는 리스너에게 REGISTERED 전달
    pub fn register(&self, properties: Properties) -> ServiceReference {
        let id = self.service_counter.fetch_add(1, Ordering::SeqCst);
        let reference = ServiceReference::new(id, properties);

        self.services.write().insert(id, reference.clone());
        debug!(service_id = id, "Registered service");

        let event = ServiceEvent::registered(reference.clone());
        self.deliver(&event, |filter| filter.matches(reference.properties()));
        reference
    }

    /// 서비스 속성 변경
    ///
    /// 새 속성이 필터와 일치하면 MODIFIED, 이전 속성만 일치했으면
    /// MODIFIED_ENDMATCH가 전달된다.
    pub fn set_properties(&self, id: u64, properties: Properties) -> Result<ServiceReference> {
        let (old, updated) = {
            let mut services = self.services.write();
            let old = services
                .get(&id)
                .cloned()
                .ok_or_else(|| Error::NotFound(format!("service {}", id)))?;
            let updated = ServiceReference::new(id, properties);
            services.insert(id, updated.clone());
            (old, updated)
        };
        debug!(service_id = id, "Modified service properties");

        let modified = ServiceEvent::modified(updated.clone());
        self.deliver(&modified, |filter| filter.matches(updated.properties()));

        let endmatch = ServiceEvent::new(ServiceEventKind::ModifiedEndmatch, updated.clone());
        self.deliver(&endmatch, |filter| {
            !filter.matches(updated.properties()) && filter.matches(old.properties())
        });

        Ok(updated)
    }

    /// 서비스 등록 해제. 필터가 일치하는 리스너에게 UNREGISTERING 전달
    pub fn unregister(&self, id: u64) -> Result<()> {
        let reference = self
            .services
            .write()
            .remove(&id)
            .ok_or_else(|| Error::NotFound(format!("service {}", id)))?;
        debug!(service_id = id, "Unregistering service");

        let event = ServiceEvent::unregistering(reference.clone());
        self.deliver(&event, |filter| filter.matches(reference.properties()));
        Ok(())
    }

    // ========================================================================
    // 조회
    // ========================================================================

    pub fn get(&self, id: u64) -> Option<ServiceReference> {
        self.services.read().get(&id).cloned()
    }

    /// 필터와 일치하는 서비스 참조 (ID 순)
    pub fn references(&self, filter: &ServiceFilter) -> Vec<ServiceReference> {
        self.services
            .read()
            .values()
            .filter(|r| filter.matches(r.properties()))
            .cloned()
            .collect()
    }

    /// 등록된 서비스 수
    pub fn len(&self) -> usize {
        self.services.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 등록된 리스너 수
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    /// 총 전달된 이벤트 수
    pub fn event_count(&self) -> u64 {
        self.event_count.load(Ordering::SeqCst)
    }

    // ========================================================================
    // 전달
    // ========================================================================

    /// 조건을 만족하는 리스너에게 이벤트 전달 (락 밖에서 호출)
    fn deliver(&self, event: &ServiceEvent, should_deliver: impl Fn(&ServiceFilter) -> bool) {
        let targets: Vec<(ListenerId, Arc<dyn ServiceListener>)> = {
            let listeners = self.listeners.read();
            let mut targets: Vec<_> = listeners
                .iter()
                .filter(|(_, registered)| should_deliver(&registered.filter))
                .map(|(id, registered)| (*id, Arc::clone(&registered.listener)))
                .collect();
            targets.sort_by_key(|(id, _)| *id);
            targets
        };

        for (id, listener) in targets {
            trace!(
                listener_id = %id,
                listener_name = listener.name(),
                event = %event,
                "Delivering service event"
            );
            self.event_count.fetch_add(1, Ordering::SeqCst);
            listener.service_changed(event);
        }
    }
}

impl Default for InMemoryServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceRegistry for InMemoryServiceRegistry {
    /// 리스너 등록 후 이미 등록되어 있는 일치 서비스에 대해 REGISTERED를 재생한다.
    /// 동시에 등록되는 서비스는 중복 전달될 수 있다.
    fn add_service_listener(
        &self,
        listener: Arc<dyn ServiceListener>,
        filter: ServiceFilter,
    ) -> Result<ListenerId> {
        let id = ListenerId::new(self.listener_counter.fetch_add(1, Ordering::SeqCst));

        debug!(
            listener_name = listener.name(),
            listener_id = %id,
            filter = %filter,
            "Registering service listener"
        );

        let existing = {
            let mut listeners = self.listeners.write();
            let existing = self.references(&filter);
            listeners.insert(
                id,
                RegisteredListener {
                    listener: Arc::clone(&listener),
                    filter,
                },
            );
            existing
        };

        for reference in existing {
            self.event_count.fetch_add(1, Ordering::SeqCst);
            listener.service_changed(&ServiceEvent::registered(reference));
        }

        Ok(id)
    }

    fn remove_service_listener(&self, id: ListenerId) -> bool {
        let removed = self.listeners.write().remove(&id).is_some();
        if removed {
            debug!(listener_id = %id, "Unregistered service listener");
        }
        removed
    }
}

// ============================================================================
// 테스트
// ============================================================================
