//! Service - 레지스트리 서비스 모델
//!
//! - `reference.rs` - 서비스 참조와 속성
//! - `event.rs` - 서비스 변경 이벤트
//! - `filter.rs` - LDAP 스타일 필터

mod event;
mod filter;
mod reference;

pub use event::{ServiceEvent, ServiceEventKind};
pub use filter::ServiceFilter;
pub use reference::{
    lookup as lookup_property, Properties, PropertyValue, ServiceReference, OBJECT_CLASS,
    SERVICE_ID, SERVICE_RANKING,
};
