//! # tether-foundation
//!
//! Foundation layer for tether:
//! - Error: 공통 에러 타입
//! - Service: 서비스 참조, 이벤트, LDAP 필터
//! - Registry: 서비스 레지스트리 경계 (trait + 인메모리 구현)
//! - Config: 임포터 설정 (TOML)
//!
//! ## 아키텍처
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  ServiceRegistry (이벤트 소스)                            │
//! │  ├── register / set_properties / unregister             │
//! │  └── add_service_listener(listener, filter)             │
//! │                     │                                   │
//! │                     ▼  ServiceEvent                     │
//! │          ServiceListener (tether-core 컬렉션)             │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod registry;
pub mod service;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, Result};

// ============================================================================
// Config (설정)
// ============================================================================
pub use config::{CollectionKind, ImporterConfig};

// ============================================================================
// Service (서비스 모델)
// ============================================================================
pub use service::{
    Properties, PropertyValue, ServiceEvent, ServiceEventKind, ServiceFilter, ServiceReference,
    OBJECT_CLASS, SERVICE_ID, SERVICE_RANKING,
};

// ============================================================================
// Registry (레지스트리)
// ============================================================================
pub use registry::{InMemoryServiceRegistry, ListenerId, ServiceListener, ServiceRegistry};
