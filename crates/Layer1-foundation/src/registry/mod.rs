//! Registry - 서비스 레지스트리 경계
//!
//! - `traits.rs` - `ServiceRegistry` / `ServiceListener` 인터페이스
//! - `memory.rs` - 프로세스 내부 레퍼런스 구현

mod memory;
mod traits;

pub use memory::InMemoryServiceRegistry;
pub use traits::{ListenerId, ServiceListener, ServiceRegistry};
