//! Service Reconciler - 레지스트리 이벤트를 컬렉션 상태로 반영
//!
//! Identity Index(서비스 ID → WrappedEntry)와 DynamicCollection은 하나의
//! 구조 락 아래에서 함께 변경된다. 리스너 호출과 해제 동작은 락을 놓은 뒤에
//! 실행된다.
//!
//! ```text
//!  ServiceEvent ──▶ Notification ──▶ [구조 락] index + storage 변경 ──▶ EventResult
//!                                                                        │
//!                         bind / unbind ◀── (락 밖) ◀───────────────────┤
//!                   satisfied / unsatisfied ◀── 0↔1 전이 (mandatory) ◀──┘
//! ```

use super::dispatch::{invoke_guarded, ListenerDispatcher};
use super::dynamic::DynamicCollection;
use super::entry::{EventResult, WrappedEntry};
use super::traits::{EntryFactory, ServiceEntry};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tether_foundation::{
    Error, Result, ServiceEvent, ServiceEventKind, ServiceListener, ServiceReference,
};
use tracing::{debug, debug_span, error, trace, warn};

// ============================================================================
// Notification
// ============================================================================

/// 조정기가 다루는 알림 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    Appeared,
    Updated,
    Disappeared,
}

impl Notification {
    /// 레지스트리 이벤트 종류 변환. 다루지 않는 종류면 None
    pub fn from_kind(kind: ServiceEventKind) -> Option<Self> {
        match kind {
            ServiceEventKind::Registered => Some(Self::Appeared),
            ServiceEventKind::Modified => Some(Self::Updated),
            ServiceEventKind::Unregistering => Some(Self::Disappeared),
            ServiceEventKind::ModifiedEndmatch => None,
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Appeared => write!(f, "appeared"),
            Self::Updated => write!(f, "updated"),
            Self::Disappeared => write!(f, "disappeared"),
        }
    }
}

/// 알림 하나를 조정한 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciled {
    /// 새 서비스가 컬렉션에 추가됨
    Admitted,

    /// 서비스가 컬렉션에서 제거됨
    Retracted,

    /// 변화 없음 (중복, 이미 없음, 저장소가 거부, 종료됨)
    Unchanged,
}

// ============================================================================
// IdentityIndex
// ============================================================================

struct IdentityIndex<E> {
    entries: BTreeMap<u64, WrappedEntry<E>>,

    /// 종료 이후에는 새 서비스를 받지 않는다
    closed: bool,
}

// ============================================================================
// ServiceReconciler
// ============================================================================

/// 레지스트리 이벤트 조정기
///
/// `ServiceListener`로 레지스트리에 등록된다. 어떤 스레드에서든, 동시에,
/// 순서 없이 호출될 수 있다.
pub struct ServiceReconciler<E> {
    /// 구조 락: Identity Index (storage 변경도 이 락 안에서만 일어난다)
    index: Mutex<IdentityIndex<E>>,

    storage: Arc<DynamicCollection<E>>,

    factory: Arc<dyn EntryFactory<E>>,

    dispatcher: Arc<ListenerDispatcher<E>>,

    mandatory: bool,
}

impl<E: ServiceEntry> ServiceReconciler<E> {
    pub(crate) fn new(
        storage: Arc<DynamicCollection<E>>,
        factory: Arc<dyn EntryFactory<E>>,
        dispatcher: Arc<ListenerDispatcher<E>>,
    ) -> Self {
        let mandatory = dispatcher.dependency().is_mandatory();
        Self {
            index: Mutex::new(IdentityIndex {
                entries: BTreeMap::new(),
                closed: false,
            }),
            storage,
            factory,
            dispatcher,
            mandatory,
        }
    }

    // ========================================================================
    // 조정
    // ========================================================================

    /// 레지스트리 이벤트 하나를 조정
    ///
    /// 다루지 않는 이벤트 종류면 `UnrecognizedEvent`, 팩토리 실패면
    /// `EntryCreation` 에러. 어느 경우든 Identity Index는 그대로다.
    pub fn reconcile(&self, event: &ServiceEvent) -> Result<Reconciled> {
        let notification = Notification::from_kind(event.kind)
            .ok_or_else(|| Error::UnrecognizedEvent(event.to_string()))?;
        self.apply(notification, &event.reference)
    }

    /// 알림 하나를 적용
    pub fn apply(&self, notification: Notification, reference: &ServiceReference) -> Result<Reconciled> {
        match notification {
            Notification::Appeared | Notification::Updated => {
                let result = self.add_service(reference)?;
                Ok(self.after_add(result))
            }
            Notification::Disappeared => {
                let result = self.remove_service(reference.id());
                Ok(self.after_remove(result))
            }
        }
    }

    /// 구조 락 안에서 추가 여부 결정
    fn add_service(&self, reference: &ServiceReference) -> Result<EventResult<E>> {
        let service_id = reference.id();
        let mut index = self.index.lock();

        if index.closed {
            trace!(service_id, "Collection destroyed, ignoring service");
            return Ok(EventResult::default());
        }
        if index.entries.contains_key(&service_id) {
            trace!(service_id, "Service already present");
            return Ok(EventResult::default());
        }

        let created = self
            .factory
            .create_entry(reference)
            .map_err(|e| Error::entry_creation(service_id, e.to_string()))?;

        let mut result = EventResult {
            entry: Some(created.entry.clone()),
            reference: Some(reference.clone()),
            ..Default::default()
        };

        // 저장소가 추가 여부를 결정한다 (set, sorted set)
        if self.storage.append(created.entry.clone()) {
            result.collection_modified = true;
            result.inform_state_listeners = self.mandatory && self.storage.len() == 1;
            index
                .entries
                .insert(service_id, WrappedEntry::new(created, reference.clone()));
        } else {
            trace!(service_id, "Storage rejected entry");
            result.release = created.release;
        }

        Ok(result)
    }

    /// 구조 락 안에서 제거
    fn remove_service(&self, service_id: u64) -> EventResult<E> {
        let mut index = self.index.lock();

        match index.entries.remove(&service_id) {
            Some(wrapped) => {
                let collection_modified = self.storage.remove_one(&wrapped.entry);
                EventResult {
                    inform_state_listeners: self.mandatory && self.storage.is_empty(),
                    collection_modified,
                    entry: Some(wrapped.entry),
                    reference: Some(wrapped.reference),
                    release: wrapped.release,
                }
            }
            None => {
                trace!(service_id, "Service not present");
                EventResult::default()
            }
        }
    }

    fn after_add(&self, result: EventResult<E>) -> Reconciled {
        let EventResult {
            entry,
            reference,
            collection_modified,
            inform_state_listeners,
            release,
        } = result;

        if let Some(release) = release {
            let service_id = reference.as_ref().map(ServiceReference::id);
            invoke_guarded("release", self.factory.name(), service_id, release);
        }

        match (entry, reference) {
            (Some(entry), Some(reference)) if collection_modified => {
                debug!(service_id = reference.id(), "Service bound");
                self.dispatcher.bind(&entry, &reference);
                if inform_state_listeners {
                    debug!(service_id = reference.id(), "Importer satisfied");
                    self.dispatcher.satisfied(reference.id());
                }
                Reconciled::Admitted
            }
            _ => Reconciled::Unchanged,
        }
    }

    fn after_remove(&self, result: EventResult<E>) -> Reconciled {
        let EventResult {
            entry,
            reference,
            collection_modified,
            inform_state_listeners,
            release,
        } = result;

        let (entry, reference) = match (entry, reference) {
            (Some(entry), Some(reference)) => (entry, reference),
            _ => return Reconciled::Unchanged,
        };

        if collection_modified {
            debug!(service_id = reference.id(), "Service unbound");
            self.dispatcher.unbind(&entry, &reference);
            if inform_state_listeners {
                debug!(service_id = reference.id(), "Importer unsatisfied");
                self.dispatcher.unsatisfied(reference.id());
            }
        }

        if let Some(release) = release {
            let service_id = reference.id();
            let released = invoke_guarded("release", self.factory.name(), Some(service_id), || {
                release().map_err(|e| Error::Release {
                    service_id,
                    message: e.to_string(),
                })
            });
            if !released {
                error!(service_id, entry = ?entry, "Failed to release entry");
            }
        }

        if collection_modified {
            Reconciled::Retracted
        } else {
            Reconciled::Unchanged
        }
    }

    // ========================================================================
    // 종료
    // ========================================================================

    /// 새 서비스 수신을 멈추고 남은 모든 서비스를 제거
    ///
    /// 각 서비스에 대해 Disappeared를 처리(unbind 호출, 해제 동작 실행)한
    /// 뒤 Identity Index와 저장소를 비운다. 개별 실패는 로그만 남긴다.
    ///
    /// 서비스마다 락을 따로 잡는다. 같은 id에 대해 동시에 도착한
    /// Disappeared는 `remove_service`의 멱등성으로 한 번만 처리된다.
    pub(crate) fn shutdown(&self) -> usize {
        let live: Vec<u64> = {
            let mut index = self.index.lock();
            index.closed = true;
            index.entries.keys().copied().collect()
        };

        let mut retracted = 0;
        for service_id in live {
            let result = self.remove_service(service_id);
            if self.after_remove(result) == Reconciled::Retracted {
                retracted += 1;
            }
        }

        let mut index = self.index.lock();
        index.entries.clear();
        self.storage.clear();
        retracted
    }

    // ========================================================================
    // 조회
    // ========================================================================

    /// Identity Index에 서비스가 있는지
    pub fn contains_identity(&self, service_id: u64) -> bool {
        self.index.lock().entries.contains_key(&service_id)
    }

    /// Identity Index의 서비스 ID (오름차순)
    pub fn identities(&self) -> Vec<u64> {
        self.index.lock().entries.keys().copied().collect()
    }

    pub fn is_closed(&self) -> bool {
        self.index.lock().closed
    }
}

impl<E: ServiceEntry> ServiceListener for ServiceReconciler<E> {
    fn name(&self) -> &str {
        self.dispatcher.dependency().bean_name()
    }

    /// 이벤트 처리. 어떤 실패도 레지스트리 전달 스레드로 전파하지 않는다.
    fn service_changed(&self, event: &ServiceEvent) {
        let span = debug_span!(
            "service_changed",
            importer = self.dispatcher.dependency().bean_name(),
            service_id = event.service_id(),
            kind = %event.kind,
        );
        let _entered = span.enter();

        match panic::catch_unwind(AssertUnwindSafe(|| self.reconcile(event))) {
            Ok(Ok(outcome)) => trace!(outcome = ?outcome, "Service event processed"),
            Ok(Err(e)) => warn!(error = %e, "service_changed() processing failed"),
            Err(_) => error!("service_changed() processing panicked"),
        }
    }
}

// ============================================================================
// 테스트
// ============================================================================
