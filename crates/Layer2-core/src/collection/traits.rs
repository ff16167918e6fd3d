//! Collection Traits - 컬렉션 경계 인터페이스
//!
//! - `ServiceEntry` - 컬렉션에 노출되는 항목
//! - `EntryFactory` - 서비스 참조 → Entry 변환 (프록시 생성 등)
//! - `ServiceLifecycleListener` - bind / unbind 콜백
//! - `ImporterStateListener` - satisfied / unsatisfied 콜백

use super::dependency::ServiceDependency;
use super::entry::CreatedEntry;
use std::fmt;
use tether_foundation::{Result, ServiceReference};

// ============================================================================
// ServiceEntry
// ============================================================================

/// 컬렉션 항목이 구현해야 하는 trait
///
/// 항목의 동일성은 레지스트리 서비스 ID로 정의되어야 한다. 같은 ID에서 만든
/// 두 항목이 `PartialEq`로 다르면 제거 시 찾지 못한다.
pub trait ServiceEntry: Clone + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// 항목을 만든 서비스 참조
    fn service_reference(&self) -> &ServiceReference;
}

impl ServiceEntry for ServiceReference {
    fn service_reference(&self) -> &ServiceReference {
        self
    }
}

// ============================================================================
// EntryFactory
// ============================================================================

/// 서비스 참조를 컬렉션 항목으로 변환
///
/// 이벤트 조정 중(구조 락 보유 상태)에 호출되므로 빨라야 한다. 실패하면
/// 해당 이벤트는 조정되지 않고 Identity Index는 변경되지 않는다.
pub trait EntryFactory<E>: Send + Sync {
    /// 팩토리 이름 (디버깅용)
    fn name(&self) -> &str {
        "entry-factory"
    }

    fn create_entry(&self, reference: &ServiceReference) -> Result<CreatedEntry<E>>;
}

/// 참조를 그대로 노출하는 팩토리
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceEntryFactory;

impl EntryFactory<ServiceReference> for ReferenceEntryFactory {
    fn name(&self) -> &str {
        "reference"
    }

    fn create_entry(&self, reference: &ServiceReference) -> Result<CreatedEntry<ServiceReference>> {
        Ok(CreatedEntry::plain(reference.clone()))
    }
}

/// 클로저 기반 팩토리
pub struct FnEntryFactory<F> {
    name: String,
    create: F,
}

impl<F> FnEntryFactory<F> {
    pub fn new(name: impl Into<String>, create: F) -> Self {
        Self {
            name: name.into(),
            create,
        }
    }
}

impl<E, F> EntryFactory<E> for FnEntryFactory<F>
where
    F: Fn(&ServiceReference) -> Result<CreatedEntry<E>> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn create_entry(&self, reference: &ServiceReference) -> Result<CreatedEntry<E>> {
        (self.create)(reference)
    }
}

// ============================================================================
// Listeners
// ============================================================================

/// 서비스 bind / unbind 리스너
///
/// 구조 락 밖에서 호출되므로 컬렉션 읽기 연산을 다시 호출해도 안전하다.
pub trait ServiceLifecycleListener<E>: Send + Sync {
    /// 리스너 이름 (로그에 사용)
    fn name(&self) -> &str {
        "lifecycle-listener"
    }

    /// 서비스가 컬렉션에 추가됨
    fn bind(&self, entry: &E, reference: &ServiceReference) -> Result<()>;

    /// 서비스가 컬렉션에서 제거됨
    fn unbind(&self, entry: &E, reference: &ServiceReference) -> Result<()>;
}

/// 임포터 상태 리스너
///
/// mandatory 컬렉션이 비어 있다가 채워지면 `importer_satisfied`,
/// 마지막 서비스가 빠지면 `importer_unsatisfied`가 전이마다 한 번 호출된다.
pub trait ImporterStateListener: Send + Sync {
    fn name(&self) -> &str {
        "state-listener"
    }

    fn importer_satisfied(&self, dependency: &ServiceDependency) -> Result<()>;

    fn importer_unsatisfied(&self, dependency: &ServiceDependency) -> Result<()>;
}
