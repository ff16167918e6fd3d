//! Error types for tether
//!
//! 모든 에러를 중앙에서 관리

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// tether 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // 설정 관련
    // ========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    // ========================================================================
    // 서비스 가용성
    // ========================================================================
    /// mandatory 컬렉션이 비어 있을 때 읽기 연산이 반환
    #[error("Service unavailable: no service matches filter {filter}")]
    ServiceUnavailable { filter: String },

    // ========================================================================
    // 컬렉션 계약
    // ========================================================================
    /// 읽기 전용 컬렉션에 대한 쓰기 연산
    #[error("Unsupported operation: {0} (collection is read-only)")]
    UnsupportedOperation(&'static str),

    #[error("Illegal state: {0}")]
    IllegalState(String),

    // ========================================================================
    // 이벤트 조정 (reconciliation)
    // ========================================================================
    #[error("Entry creation failed for service {service_id}: {message}")]
    EntryCreation { service_id: u64, message: String },

    #[error("Unrecognized service event: {0}")]
    UnrecognizedEvent(String),

    // ========================================================================
    // 리스너 관련
    // ========================================================================
    #[error("Listener '{listener}' failed: {message}")]
    Listener { listener: String, message: String },

    #[error("Release action failed for service {service_id}: {message}")]
    Release { service_id: u64, message: String },

    // ========================================================================
    // 필터 / 레지스트리
    // ========================================================================
    #[error("Invalid filter '{filter}': {message}")]
    InvalidFilter { filter: String, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    // ========================================================================
    // 외부 에러 변환
    // ========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    // ========================================================================
    // 기타
    // ========================================================================
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// 재시도 가능한 에러인지 확인
    ///
    /// 서비스가 나중에 등록될 수 있으므로 `ServiceUnavailable`만 재시도 대상
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::ServiceUnavailable { .. })
    }

    /// 사용자에게 보여줄 수 있는 에러인지 확인
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Error::ServiceUnavailable { .. }
                | Error::UnsupportedOperation(_)
                | Error::InvalidFilter { .. }
                | Error::Config(_)
                | Error::NotFound(_)
        )
    }

    /// 서비스 불가 에러 생성 헬퍼
    pub fn service_unavailable(filter: impl std::fmt::Display) -> Self {
        Error::ServiceUnavailable {
            filter: filter.to_string(),
        }
    }

    /// 리스너 에러 생성 헬퍼
    pub fn listener(listener: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Listener {
            listener: listener.into(),
            message: message.into(),
        }
    }

    /// Entry 생성 실패 에러 생성 헬퍼
    pub fn entry_creation(service_id: u64, message: impl Into<String>) -> Self {
        Error::EntryCreation {
            service_id,
            message: message.into(),
        }
    }

    /// 필터 파싱 에러 생성 헬퍼
    pub fn invalid_filter(filter: impl Into<String>, message: impl Into<String>) -> Self {
        Error::InvalidFilter {
            filter: filter.into(),
            message: message.into(),
        }
    }
}

// ============================================================================
// From 구현 (추가 변환)
// ============================================================================

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Internal(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Internal(s.to_string())
    }
}
