//! Collection Entry - 팩토리 산출물과 Identity Index 값

use std::fmt;
use tether_foundation::{Result, ServiceReference};

/// 서비스가 컬렉션에서 빠질 때 한 번 실행되는 해제 동작
pub type ReleaseAction = Box<dyn FnOnce() -> Result<()> + Send>;

// ============================================================================
// CreatedEntry - EntryFactory 산출물
// ============================================================================

/// 팩토리가 만든 Entry와 선택적 해제 동작
pub struct CreatedEntry<E> {
    pub entry: E,
    pub release: Option<ReleaseAction>,
}

impl<E> CreatedEntry<E> {
    /// 해제 동작이 없는 Entry (참조를 그대로 노출하는 경우)
    pub fn plain(entry: E) -> Self {
        Self {
            entry,
            release: None,
        }
    }

    /// 해제 동작이 있는 Entry (프록시)
    pub fn with_release(entry: E, release: impl FnOnce() -> Result<()> + Send + 'static) -> Self {
        Self {
            entry,
            release: Some(Box::new(release)),
        }
    }
}

impl<E: fmt::Debug> fmt::Debug for CreatedEntry<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreatedEntry")
            .field("entry", &self.entry)
            .field("release", &self.release.is_some())
            .finish()
    }
}

// ============================================================================
// WrappedEntry - Identity Index 값
// ============================================================================

/// Identity Index가 소유하는 값: Entry, 원본 참조, 해제 동작
pub(crate) struct WrappedEntry<E> {
    pub(crate) entry: E,
    pub(crate) reference: ServiceReference,
    pub(crate) release: Option<ReleaseAction>,
}

impl<E> WrappedEntry<E> {
    pub(crate) fn new(created: CreatedEntry<E>, reference: ServiceReference) -> Self {
        Self {
            entry: created.entry,
            reference,
            release: created.release,
        }
    }
}

// ============================================================================
// EventResult - 조정 결과
// ============================================================================

/// 이벤트 하나를 조정한 결과 (락 밖에서 리스너 호출에 사용)
pub(crate) struct EventResult<E> {
    /// 추가/제거된 Entry
    pub(crate) entry: Option<E>,

    /// 원본 참조
    pub(crate) reference: Option<ServiceReference>,

    /// 컬렉션 내용이 바뀌었는지
    pub(crate) collection_modified: bool,

    /// 상태 리스너(satisfied/unsatisfied)에 알려야 하는지
    pub(crate) inform_state_listeners: bool,

    /// 락 해제 후 실행할 해제 동작
    pub(crate) release: Option<ReleaseAction>,
}

impl<E> Default for EventResult<E> {
    fn default() -> Self {
        Self {
            entry: None,
            reference: None,
            collection_modified: false,
            inform_state_listeners: false,
            release: None,
        }
    }
}
