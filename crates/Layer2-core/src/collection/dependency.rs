//! Service Dependency - 상태 이벤트에 전달되는 임포터 의존성 정보

use std::fmt;
use tether_foundation::ServiceFilter;

/// 임포터가 선언한 서비스 의존성
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceDependency {
    bean_name: String,
    filter: ServiceFilter,
    mandatory: bool,
}

impl ServiceDependency {
    pub fn new(bean_name: impl Into<String>, filter: ServiceFilter, mandatory: bool) -> Self {
        Self {
            bean_name: bean_name.into(),
            filter,
            mandatory,
        }
    }

    pub fn bean_name(&self) -> &str {
        &self.bean_name
    }

    pub fn filter(&self) -> &ServiceFilter {
        &self.filter
    }

    /// 최소 한 개의 서비스가 필요한지
    pub fn is_mandatory(&self) -> bool {
        self.mandatory
    }
}

impl fmt::Display for ServiceDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DependencyService[Name={}][Filter={}][Mandatory={}]",
            self.bean_name, self.filter, self.mandatory
        )
    }
}
