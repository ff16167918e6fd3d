//! Service Proxy - 서비스 참조를 감싸는 무효화 가능한 핸들

use super::entry::CreatedEntry;
use super::traits::{EntryFactory, ServiceEntry};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tether_foundation::{Error, Result, ServiceReference};
use tracing::trace;

/// 임포트된 서비스 프록시
///
/// 해제 동작이 실행되면 무효화되고, 이후 `invoke`는 `ServiceUnavailable`을
/// 반환한다. 동일성은 서비스 ID 기준이다.
#[derive(Clone)]
pub struct ServiceProxy {
    reference: ServiceReference,
    valid: Arc<AtomicBool>,
}

impl ServiceProxy {
    fn new(reference: ServiceReference) -> Self {
        Self {
            reference,
            valid: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid.load(Ordering::SeqCst)
    }

    /// 서비스가 아직 유효하면 참조로 작업 실행
    pub fn invoke<R>(&self, call: impl FnOnce(&ServiceReference) -> R) -> Result<R> {
        if !self.is_valid() {
            return Err(Error::service_unavailable(format!("(service.id={})", self.reference.id())));
        }
        Ok(call(&self.reference))
    }

    fn invalidate(&self) {
        self.valid.store(false, Ordering::SeqCst);
    }
}

impl PartialEq for ServiceProxy {
    fn eq(&self, other: &Self) -> bool {
        self.reference == other.reference
    }
}

impl fmt::Debug for ServiceProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceProxy")
            .field("service_id", &self.reference.id())
            .field("valid", &self.is_valid())
            .finish()
    }
}

impl ServiceEntry for ServiceProxy {
    fn service_reference(&self) -> &ServiceReference {
        &self.reference
    }
}

/// 프록시를 만들고, 해제 시 프록시를 무효화하는 팩토리
#[derive(Debug, Clone, Copy, Default)]
pub struct ProxyEntryFactory;

impl EntryFactory<ServiceProxy> for ProxyEntryFactory {
    fn name(&self) -> &str {
        "proxy"
    }

    fn create_entry(&self, reference: &ServiceReference) -> Result<CreatedEntry<ServiceProxy>> {
        let proxy = ServiceProxy::new(reference.clone());
        let handle = proxy.clone();
        Ok(CreatedEntry::with_release(proxy, move || {
            trace!(service_id = handle.reference.id(), "Invalidating service proxy");
            handle.invalidate();
            Ok(())
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_foundation::Properties;

    #[test]
    fn test_release_invalidates_proxy() {
        let reference = ServiceReference::new(3, Properties::new());
        let created = ProxyEntryFactory.create_entry(&reference).unwrap();
        let proxy = created.entry.clone();

        assert_eq!(proxy.invoke(|r| r.id()).unwrap(), 3);

        (created.release.unwrap())().unwrap();
        assert!(!proxy.is_valid());
        assert!(matches!(proxy.invoke(|r| r.id()), Err(Error::ServiceUnavailable { .. })));
    }

    #[test]
    fn test_proxy_equality_by_service_id() {
        let reference = ServiceReference::new(9, Properties::new());
        let a = ProxyEntryFactory.create_entry(&reference).unwrap().entry;
        let b = ProxyEntryFactory.create_entry(&reference).unwrap().entry;
        assert_eq!(a, b);
    }
}
