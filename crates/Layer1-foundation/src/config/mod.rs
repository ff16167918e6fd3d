//! Config - 설정 관리
//!
//! - `importer.rs` - 서비스 컬렉션 임포터 설정

mod importer;

pub use importer::{CollectionKind, ImporterConfig};
