//! Transcript - 리플레이 중 발생한 콜백과 읽기 결과 기록

use crate::scenario::NAME_PROPERTY;
use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use tether_core::{ImporterStateListener, ServiceDependency, ServiceEntry, ServiceLifecycleListener};
use tether_foundation::{Result, ServiceReference};

/// 기록 한 줄
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum Record {
    Step {
        index: usize,
        step: String,
    },
    Initialized {
        satisfied: bool,
        error: Option<String>,
    },
    Bind {
        service_id: u64,
        name: Option<String>,
    },
    Unbind {
        service_id: u64,
        name: Option<String>,
    },
    Satisfied {
        importer: String,
    },
    Unsatisfied {
        importer: String,
    },
    Read {
        size: Option<usize>,
        services: Vec<String>,
        error: Option<String>,
    },
    Destroyed {
        retracted: usize,
    },
}

fn label(service_id: u64, name: &Option<String>) -> String {
    match name {
        Some(name) => format!("service {} ({})", service_id, name),
        None => format!("service {}", service_id),
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Step { index, step } => write!(f, "#{} {}", index, step),
            Self::Initialized { satisfied, error } => match error {
                Some(error) => write!(f, "  initialized (satisfied={}): {}", satisfied, error),
                None => write!(f, "  initialized (satisfied={})", satisfied),
            },
            Self::Bind { service_id, name } => write!(f, "  bind        {}", label(*service_id, name)),
            Self::Unbind { service_id, name } => write!(f, "  unbind      {}", label(*service_id, name)),
            Self::Satisfied { importer } => write!(f, "  satisfied   {}", importer),
            Self::Unsatisfied { importer } => write!(f, "  unsatisfied {}", importer),
            Self::Read { size, services, error } => match (size, error) {
                (_, Some(error)) => write!(f, "  read        error: {}", error),
                (Some(size), None) => write!(f, "  read        size={} [{}]", size, services.join(", ")),
                (None, None) => write!(f, "  read"),
            },
            Self::Destroyed { retracted } => write!(f, "destroyed ({} retracted)", retracted),
        }
    }
}

/// 서비스 표시 이름 (`name` 속성)
pub fn service_name(reference: &ServiceReference) -> Option<String> {
    reference.property(NAME_PROPERTY).map(|v| v.to_string())
}

/// 리플레이 기록. 컬렉션 리스너로 등록된다.
#[derive(Default)]
pub struct Transcript {
    records: Mutex<Vec<Record>>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, record: Record) {
        self.records.lock().push(record);
    }

    pub fn records(&self) -> Vec<Record> {
        self.records.lock().clone()
    }

    pub fn render_text(&self) -> String {
        self.records
            .lock()
            .iter()
            .map(|r| r.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn render_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&*self.records.lock())
    }
}

impl<E: ServiceEntry> ServiceLifecycleListener<E> for Transcript {
    fn name(&self) -> &str {
        "transcript"
    }

    fn bind(&self, _entry: &E, reference: &ServiceReference) -> Result<()> {
        self.record(Record::Bind {
            service_id: reference.id(),
            name: service_name(reference),
        });
        Ok(())
    }

    fn unbind(&self, _entry: &E, reference: &ServiceReference) -> Result<()> {
        self.record(Record::Unbind {
            service_id: reference.id(),
            name: service_name(reference),
        });
        Ok(())
    }
}

impl ImporterStateListener for Transcript {
    fn name(&self) -> &str {
        "transcript"
    }

    fn importer_satisfied(&self, dependency: &ServiceDependency) -> Result<()> {
        self.record(Record::Satisfied {
            importer: dependency.bean_name().to_string(),
        });
        Ok(())
    }

    fn importer_unsatisfied(&self, dependency: &ServiceDependency) -> Result<()> {
        self.record(Record::Unsatisfied {
            importer: dependency.bean_name().to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_foundation::{Properties, PropertyValue};

    #[test]
    fn test_render_text() {
        let transcript = Transcript::new();
        transcript.record(Record::Step {
            index: 1,
            step: "register english".to_string(),
        });
        transcript.record(Record::Bind {
            service_id: 1,
            name: Some("english".to_string()),
        });
        transcript.record(Record::Read {
            size: Some(1),
            services: vec!["english".to_string()],
            error: None,
        });

        let text = transcript.render_text();
        assert_eq!(
            text,
            "#1 register english\n  bind        service 1 (english)\n  read        size=1 [english]"
        );
    }

    #[test]
    fn test_render_json_tags_events() {
        let transcript = Transcript::new();
        transcript.record(Record::Satisfied {
            importer: "greeters".to_string(),
        });
        transcript.record(Record::Destroyed { retracted: 2 });

        let json: serde_json::Value = serde_json::from_str(&transcript.render_json().unwrap()).unwrap();
        assert_eq!(json[0]["event"], "satisfied");
        assert_eq!(json[0]["importer"], "greeters");
        assert_eq!(json[1]["event"], "destroyed");
        assert_eq!(json[1]["retracted"], 2);
    }

    #[test]
    fn test_service_name() {
        let mut props = Properties::new();
        props.insert(NAME_PROPERTY.to_string(), PropertyValue::from("french"));
        let reference = ServiceReference::new(4, props);
        assert_eq!(service_name(&reference), Some("french".to_string()));
        assert_eq!(service_name(&ServiceReference::new(5, Properties::new())), None);
    }
}
