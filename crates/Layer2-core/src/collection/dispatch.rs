//! Listener Dispatch - bind/unbind 및 상태 리스너 호출
//!
//! 리스너 실패(에러 또는 panic)는 로그만 남기고 나머지 리스너 호출을 계속한다.

use super::dependency::ServiceDependency;
use super::traits::{ImporterStateListener, ServiceLifecycleListener};
use parking_lot::{ReentrantMutex, RwLock};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tether_foundation::{Result, ServiceReference};
use tracing::{error, trace, warn};

/// 리스너 / 해제 동작을 호출하고 실패를 격리
///
/// 정상 완료면 true
pub(crate) fn invoke_guarded(
    what: &str,
    name: &str,
    service_id: Option<u64>,
    call: impl FnOnce() -> Result<()>,
) -> bool {
    match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            warn!(listener = name, service_id = ?service_id, error = %e, "{} failed", what);
            false
        }
        Err(payload) => {
            error!(
                listener = name,
                service_id = ?service_id,
                panic = panic_message(payload.as_ref()),
                "{} panicked",
                what
            );
            false
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "<non-string panic payload>"
    }
}

// ============================================================================
// ListenerDispatcher
// ============================================================================

/// 컬렉션 리스너 목록과 호출
pub(crate) struct ListenerDispatcher<E> {
    /// bind / unbind 리스너
    lifecycle: RwLock<Vec<Arc<dyn ServiceLifecycleListener<E>>>>,

    /// 상태 리스너 목록 (목록만 보호, 호출 중에는 잡지 않음)
    state: RwLock<Vec<Arc<dyn ImporterStateListener>>>,

    /// satisfied / unsatisfied 호출 직렬화. 같은 스레드에서 재진입 가능
    state_dispatch: ReentrantMutex<()>,

    dependency: ServiceDependency,
}

impl<E> ListenerDispatcher<E> {
    pub(crate) fn new(dependency: ServiceDependency) -> Self {
        Self {
            lifecycle: RwLock::new(Vec::new()),
            state: RwLock::new(Vec::new()),
            state_dispatch: ReentrantMutex::new(()),
            dependency,
        }
    }

    pub(crate) fn dependency(&self) -> &ServiceDependency {
        &self.dependency
    }

    pub(crate) fn add_lifecycle_listener(&self, listener: Arc<dyn ServiceLifecycleListener<E>>) {
        self.lifecycle.write().push(listener);
    }

    pub(crate) fn add_state_listener(&self, listener: Arc<dyn ImporterStateListener>) {
        self.state.write().push(listener);
    }

    pub(crate) fn lifecycle_listener_count(&self) -> usize {
        self.lifecycle.read().len()
    }

    pub(crate) fn state_listener_count(&self) -> usize {
        self.state.read().len()
    }

    // ========================================================================
    // bind / unbind
    // ========================================================================

    /// 목록 스냅샷을 떠서 락 없이 호출 (리스너가 리스너를 추가해도 안전)
    fn lifecycle_snapshot(&self) -> Vec<Arc<dyn ServiceLifecycleListener<E>>> {
        self.lifecycle.read().clone()
    }

    pub(crate) fn bind(&self, entry: &E, reference: &ServiceReference) {
        for listener in self.lifecycle_snapshot() {
            trace!(listener = listener.name(), service_id = reference.id(), "Calling bind");
            invoke_guarded("bind", listener.name(), Some(reference.id()), || {
                listener.bind(entry, reference)
            });
        }
    }

    pub(crate) fn unbind(&self, entry: &E, reference: &ServiceReference) {
        for listener in self.lifecycle_snapshot() {
            trace!(listener = listener.name(), service_id = reference.id(), "Calling unbind");
            invoke_guarded("unbind", listener.name(), Some(reference.id()), || {
                listener.unbind(entry, reference)
            });
        }
    }

    // ========================================================================
    // satisfied / unsatisfied
    // ========================================================================

    fn state_snapshot(&self) -> Vec<Arc<dyn ImporterStateListener>> {
        self.state.read().clone()
    }

    /// 리스너가 컬렉션이나 레지스트리를 다시 호출해도 교착되지 않는다
    pub(crate) fn satisfied(&self, service_id: u64) {
        let _serial = self.state_dispatch.lock();
        for listener in self.state_snapshot() {
            invoke_guarded("importer_satisfied", listener.name(), Some(service_id), || {
                listener.importer_satisfied(&self.dependency)
            });
        }
    }

    pub(crate) fn unsatisfied(&self, service_id: u64) {
        let _serial = self.state_dispatch.lock();
        for listener in self.state_snapshot() {
            invoke_guarded("importer_unsatisfied", listener.name(), Some(service_id), || {
                listener.importer_unsatisfied(&self.dependency)
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tether_foundation::{Error, Properties, ServiceFilter};

    struct Counting {
        name: &'static str,
        calls: AtomicUsize,
        fail: bool,
        panic: bool,
    }

    impl Counting {
        fn new(name: &'static str, fail: bool, panic: bool) -> Arc<Self> {
            Arc::new(Self {
                name,
                calls: AtomicUsize::new(0),
                fail,
                panic,
            })
        }

        fn touch(&self) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.panic {
                panic!("listener {} exploded", self.name);
            }
            if self.fail {
                return Err(Error::listener(self.name, "refused"));
            }
            Ok(())
        }
    }

    impl ServiceLifecycleListener<ServiceReference> for Counting {
        fn name(&self) -> &str {
            self.name
        }

        fn bind(&self, _: &ServiceReference, _: &ServiceReference) -> Result<()> {
            self.touch()
        }

        fn unbind(&self, _: &ServiceReference, _: &ServiceReference) -> Result<()> {
            self.touch()
        }
    }

    impl ImporterStateListener for Counting {
        fn name(&self) -> &str {
            self.name
        }

        fn importer_satisfied(&self, _: &ServiceDependency) -> Result<()> {
            self.touch()
        }

        fn importer_unsatisfied(&self, _: &ServiceDependency) -> Result<()> {
            self.touch()
        }
    }

    fn dispatcher() -> ListenerDispatcher<ServiceReference> {
        let filter = ServiceFilter::parse("(a=b)").unwrap();
        ListenerDispatcher::new(ServiceDependency::new("test", filter, true))
    }

    #[test]
    fn test_failing_listener_does_not_stop_others() {
        let dispatcher = dispatcher();
        let failing = Counting::new("failing", true, false);
        let panicking = Counting::new("panicking", false, true);
        let healthy = Counting::new("healthy", false, false);
        dispatcher.add_lifecycle_listener(failing.clone());
        dispatcher.add_lifecycle_listener(panicking.clone());
        dispatcher.add_lifecycle_listener(healthy.clone());

        let reference = ServiceReference::new(1, Properties::new());
        dispatcher.bind(&reference, &reference);
        dispatcher.unbind(&reference, &reference);

        assert_eq!(failing.calls.load(Ordering::SeqCst), 2);
        assert_eq!(panicking.calls.load(Ordering::SeqCst), 2);
        assert_eq!(healthy.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_state_listeners_called_in_order() {
        let dispatcher = dispatcher();
        let first = Counting::new("first", true, false);
        let second = Counting::new("second", false, false);
        dispatcher.add_state_listener(first.clone());
        dispatcher.add_state_listener(second.clone());

        dispatcher.satisfied(1);
        dispatcher.unsatisfied(1);

        assert_eq!(first.calls.load(Ordering::SeqCst), 2);
        assert_eq!(second.calls.load(Ordering::SeqCst), 2);
        assert_eq!(dispatcher.state_listener_count(), 2);
    }

    /// 호출 중에 같은 디스패처를 다시 사용하는 상태 리스너
    struct Reentrant {
        dispatcher: std::sync::OnceLock<std::sync::Weak<ListenerDispatcher<ServiceReference>>>,
        counts: parking_lot::Mutex<Vec<usize>>,
    }

    impl ImporterStateListener for Reentrant {
        fn importer_satisfied(&self, _: &ServiceDependency) -> Result<()> {
            if let Some(dispatcher) = self.dispatcher.get().and_then(std::sync::Weak::upgrade) {
                self.counts.lock().push(dispatcher.state_listener_count());
            }
            Ok(())
        }

        fn importer_unsatisfied(&self, _: &ServiceDependency) -> Result<()> {
            // 같은 스레드에서 다음 전이가 일어나는 경우
            if let Some(dispatcher) = self.dispatcher.get().and_then(std::sync::Weak::upgrade) {
                dispatcher.add_state_listener(Counting::new("late", false, false));
                dispatcher.satisfied(2);
            }
            Ok(())
        }
    }

    #[test]
    fn test_state_dispatch_is_reentrant() {
        let dispatcher = Arc::new(dispatcher());
        let listener = Arc::new(Reentrant {
            dispatcher: std::sync::OnceLock::new(),
            counts: parking_lot::Mutex::new(Vec::new()),
        });
        let _ = listener.dispatcher.set(Arc::downgrade(&dispatcher));
        dispatcher.add_state_listener(listener.clone());

        dispatcher.satisfied(1);
        dispatcher.unsatisfied(1);

        assert_eq!(*listener.counts.lock(), vec![1, 2]);
        assert_eq!(dispatcher.state_listener_count(), 2);
    }

    #[test]
    fn test_invoke_guarded_reports_outcome() {
        assert!(invoke_guarded("release", "ok", None, || Ok(())));
        assert!(!invoke_guarded("release", "err", Some(1), || Err(Error::from("boom"))));
        assert!(!invoke_guarded("release", "panic", Some(2), || panic!("boom")));
    }
}
