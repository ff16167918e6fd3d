//! tether-core: Core Runtime for tether
//!
//! Layer2 - 동적 서비스 컬렉션 레이어
//!
//! # 주요 모듈
//!
//! - `collection`: 레지스트리 이벤트를 반영하는 읽기 전용 서비스 컬렉션
//!   - `DynamicCollection`: 반복 중 변경을 허용하는 저장소
//!   - `ServiceReconciler`: Identity Index + 이벤트 조정
//!   - `ServiceCollection`: mandatory 검사, 리스너 등록, 라이프사이클
//!
//! # 사용 예시
//!
//! ```ignore
//! use tether_core::{ServiceCollection, ProxyEntryFactory, ServiceProxy};
//! use tether_foundation::{ImporterConfig, InMemoryServiceRegistry};
//!
//! let config = ImporterConfig::load("importer.toml")?;
//! let registry = Arc::new(InMemoryServiceRegistry::new());
//!
//! let collection = ServiceCollection::<ServiceProxy>::from_config(
//!     &config,
//!     registry.clone(),
//!     Arc::new(ProxyEntryFactory),
//! )?
//! .build()?;
//!
//! collection.add_state_listener(Arc::new(MyStateListener));
//! collection.initialize()?;
//!
//! let size = collection.len()?;
//! ```

pub mod collection;

// Re-exports: Collection
pub use collection::{
    Comparator, CreatedEntry, DynamicCollection, DynamicIter, EntryFactory, FnEntryFactory,
    ImporterStateListener, Notification, ProxyEntryFactory, Reconciled, ReferenceEntryFactory,
    ReleaseAction, ServiceCollection, ServiceCollectionBuilder, ServiceDependency, ServiceEntry,
    ServiceIter, ServiceLifecycleListener, ServiceProxy, ServiceReconciler, StorageMode,
};
