//! # Dynamic Service Collection
//!
//! 레지스트리 서비스를 실시간으로 반영하는 읽기 전용 컬렉션
//!
//! ## 개요
//!
//! 필터와 일치하는 서비스가 레지스트리에 나타나고 사라질 때마다 컬렉션이
//! 갱신됩니다. 이벤트는 어떤 스레드에서든, 동시에, 중복되거나 순서가 뒤바뀐
//! 채로 도착할 수 있습니다.
//!
//! ## 설계 원칙
//!
//! 1. **Identity by service id**: 중복 추가 없음, 제거 누락 없음
//! 2. **Live iteration**: 반복 중 구조 변경이 있어도 실패하지 않음
//! 3. **Exactly-once transition**: 0→1에 satisfied, 1→0에 unsatisfied 한 번씩
//! 4. **Callbacks outside the lock**: 리스너는 컬렉션을 다시 읽을 수 있음
//!
//! ## 아키텍처
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  ServiceCollection<E>                        │
//! │   reads ──▶ mandatory check ──▶ DynamicCollection<E>        │
//! │   writes ──▶ UnsupportedOperation                            │
//! │                                                              │
//! │  ┌─────────────────────────────────────────────────────────┐│
//! │  │  ServiceReconciler<E>  (ServiceListener)                ││
//! │  │  Mutex<IdentityIndex>: service id → WrappedEntry<E>     ││
//! │  │        │ EntryFactory<E>::create_entry                  ││
//! │  │        ▼                                                ││
//! │  │  DynamicCollection<E>: List | Set | Sorted*             ││
//! │  └─────────────────────────────────────────────────────────┘│
//! │                          │ (락 해제 후)                      │
//! │  ┌───────────────────────┼───────────────────────────────┐  │
//! │  │   ListenerDispatcher  │                               │  │
//! │  │  - bind / unbind      │                               │  │
//! │  │  - satisfied / unsatisfied (mandatory, 0↔1)           │  │
//! │  └───────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 사용 예시
//!
//! ```ignore
//! use tether_core::{ServiceCollection, ReferenceEntryFactory};
//! use tether_foundation::{InMemoryServiceRegistry, ServiceFilter};
//!
//! let registry = Arc::new(InMemoryServiceRegistry::new());
//! let collection = ServiceCollection::<ServiceReference>::builder()
//!     .registry(registry.clone())
//!     .factory(Arc::new(ReferenceEntryFactory))
//!     .filter(ServiceFilter::parse("(objectClass=Greeter)")?)
//!     .mandatory(false)
//!     .build()?;
//! collection.initialize()?;
//!
//! registry.register(props);
//! for service in collection.iter()? {
//!     println!("{}", service);
//! }
//!
//! collection.destroy();
//! ```

mod dependency;
mod dispatch;
mod dynamic;
mod entry;
mod proxy;
mod reconciler;
mod service_collection;
mod traits;

pub use dependency::ServiceDependency;
pub use dynamic::{Comparator, DynamicCollection, DynamicIter, StorageMode};
pub use entry::{CreatedEntry, ReleaseAction};
pub use proxy::{ProxyEntryFactory, ServiceProxy};
pub use reconciler::{Notification, Reconciled, ServiceReconciler};
pub use service_collection::{ServiceCollection, ServiceCollectionBuilder, ServiceIter};
pub use traits::{
    EntryFactory, FnEntryFactory, ImporterStateListener, ReferenceEntryFactory, ServiceEntry,
    ServiceLifecycleListener,
};
