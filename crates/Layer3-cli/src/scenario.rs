//! Scenario - 레지스트리 시나리오 파일
//!
//! ```toml
//! [importer]
//! beanName = "greeters"
//! filter = "(objectClass=Greeter)"
//! collection = "sortedList"
//! sortBy = "name"
//!
//! [[step]]
//! action = "register"
//! name = "english"
//! properties = { objectClass = "Greeter", "service.ranking" = 5 }
//!
//! [[step]]
//! action = "read"
//!
//! [[step]]
//! action = "unregister"
//! name = "english"
//! ```
//!
//! 서비스는 시나리오 안에서 `name`으로 가리킨다. 등록 시 `name` 속성이 없으면
//! 시나리오 이름이 속성으로 추가된다.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tether_foundation::{ImporterConfig, Properties, PropertyValue};

/// 시나리오 이름 속성 키
pub const NAME_PROPERTY: &str = "name";

/// 시나리오 파일
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScenarioFile {
    #[serde(default)]
    pub importer: ImporterConfig,

    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

/// 시나리오 단계
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Step {
    /// 서비스 등록
    Register {
        name: String,
        #[serde(default)]
        properties: Properties,
    },

    /// 서비스 속성 교체
    Modify { name: String, properties: Properties },

    /// 서비스 등록 해제
    Unregister { name: String },

    /// 컬렉션 읽기 결과 기록
    Read,
}

impl Step {
    pub fn is_register(&self) -> bool {
        matches!(self, Self::Register { .. })
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Register { name, .. } => write!(f, "register {}", name),
            Self::Modify { name, .. } => write!(f, "modify {}", name),
            Self::Unregister { name } => write!(f, "unregister {}", name),
            Self::Read => write!(f, "read"),
        }
    }
}

impl ScenarioFile {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let scenario: Self = toml::from_str(content).context("invalid scenario file")?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("in {}", path.display()))
    }

    /// 임포터 설정 검증 + 등록되지 않은 이름 참조 검사
    pub fn validate(&self) -> Result<()> {
        self.importer.validate()?;

        let mut live: Vec<&str> = Vec::new();
        for (index, step) in self.steps.iter().enumerate() {
            match step {
                Step::Register { name, .. } => {
                    if live.contains(&name.as_str()) {
                        bail!("step {}: service '{}' is already registered", index + 1, name);
                    }
                    live.push(name);
                }
                Step::Modify { name, .. } => {
                    if !live.contains(&name.as_str()) {
                        bail!("step {}: unknown service '{}'", index + 1, name);
                    }
                }
                Step::Unregister { name } => {
                    let position = live
                        .iter()
                        .position(|n| *n == name.as_str())
                        .with_context(|| format!("step {}: unknown service '{}'", index + 1, name))?;
                    live.remove(position);
                }
                Step::Read => {}
            }
        }
        Ok(())
    }
}

/// 등록할 속성. `name` 속성이 없으면 시나리오 이름을 넣는다.
pub fn service_properties(name: &str, properties: &Properties) -> Properties {
    let mut properties = properties.clone();
    properties
        .entry(NAME_PROPERTY.to_string())
        .or_insert_with(|| PropertyValue::from(name));
    properties
}
