//! Replay - 시나리오를 인메모리 레지스트리와 컬렉션에 적용
//!
//! `--parallel`이면 연속된 register 단계를 blocking 풀에서 동시에 실행해
//! 여러 스레드에서 이벤트가 전달되도록 한다.

use crate::scenario::{service_properties, ScenarioFile, Step};
use crate::transcript::{service_name, Record, Transcript};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tether_core::{
    EntryFactory, ProxyEntryFactory, ReferenceEntryFactory, ServiceCollection, ServiceEntry,
    ServiceProxy,
};
use tether_foundation::{Error, InMemoryServiceRegistry, ServiceReference};
use tracing::{debug, info};

/// 리플레이 옵션
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplayOptions {
    pub parallel: bool,
}

/// 시나리오 실행 후 기록 반환
pub async fn replay(scenario: &ScenarioFile, options: ReplayOptions) -> Result<Arc<Transcript>> {
    let registry = Arc::new(InMemoryServiceRegistry::new());
    let transcript = Arc::new(Transcript::new());

    info!(
        importer = %scenario.importer.bean_name,
        steps = scenario.steps.len(),
        proxies = scenario.importer.proxies,
        parallel = options.parallel,
        "Replaying scenario"
    );

    if scenario.importer.proxies {
        let factory: Arc<dyn EntryFactory<ServiceProxy>> = Arc::new(ProxyEntryFactory);
        run(scenario, registry, factory, &transcript, options).await?;
    } else {
        let factory: Arc<dyn EntryFactory<ServiceReference>> = Arc::new(ReferenceEntryFactory);
        run(scenario, registry, factory, &transcript, options).await?;
    }

    Ok(transcript)
}

async fn run<E: ServiceEntry>(
    scenario: &ScenarioFile,
    registry: Arc<InMemoryServiceRegistry>,
    factory: Arc<dyn EntryFactory<E>>,
    transcript: &Arc<Transcript>,
    options: ReplayOptions,
) -> Result<()> {
    let collection = ServiceCollection::<E>::from_config(&scenario.importer, registry.clone(), factory)?
        .lifecycle_listener(transcript.clone())
        .state_listener(transcript.clone())
        .build()?;

    match collection.initialize() {
        Ok(()) => transcript.record(Record::Initialized {
            satisfied: collection.is_satisfied(),
            error: None,
        }),
        Err(e @ Error::ServiceUnavailable { .. }) => transcript.record(Record::Initialized {
            satisfied: false,
            error: Some(e.to_string()),
        }),
        Err(e) => return Err(e.into()),
    }

    let steps = &scenario.steps;
    let mut names: HashMap<String, u64> = HashMap::new();
    let mut next = 0;

    while next < steps.len() {
        if options.parallel && steps[next].is_register() {
            let end = steps[next..]
                .iter()
                .position(|s| !s.is_register())
                .map_or(steps.len(), |offset| next + offset);
            register_batch(&steps[next..end], next, &registry, &mut names, transcript).await?;
            next = end;
            continue;
        }

        transcript.record(Record::Step {
            index: next + 1,
            step: steps[next].to_string(),
        });
        apply_step(&steps[next], &registry, &collection, &mut names, transcript)?;
        next += 1;
    }

    let retracted = collection.destroy();
    transcript.record(Record::Destroyed { retracted });
    Ok(())
}

/// 연속된 register 단계를 동시에 실행
async fn register_batch(
    batch: &[Step],
    offset: usize,
    registry: &Arc<InMemoryServiceRegistry>,
    names: &mut HashMap<String, u64>,
    transcript: &Transcript,
) -> Result<()> {
    debug!(size = batch.len(), "Registering batch in parallel");

    let mut handles = Vec::with_capacity(batch.len());
    for (i, step) in batch.iter().enumerate() {
        transcript.record(Record::Step {
            index: offset + i + 1,
            step: step.to_string(),
        });
        if let Step::Register { name, properties } = step {
            let registry = Arc::clone(registry);
            let properties = service_properties(name, properties);
            let name = name.clone();
            handles.push(tokio::task::spawn_blocking(move || {
                let id = registry.register(properties).id();
                (name, id)
            }));
        }
    }

    for handle in handles {
        let (name, id) = handle.await.context("register task failed")?;
        names.insert(name, id);
    }
    Ok(())
}

fn apply_step<E: ServiceEntry>(
    step: &Step,
    registry: &InMemoryServiceRegistry,
    collection: &ServiceCollection<E>,
    names: &mut HashMap<String, u64>,
    transcript: &Transcript,
) -> Result<()> {
    match step {
        Step::Register { name, properties } => {
            let reference = registry.register(service_properties(name, properties));
            names.insert(name.clone(), reference.id());
        }
        Step::Modify { name, properties } => {
            let id = *names
                .get(name)
                .with_context(|| format!("unknown service '{}'", name))?;
            registry.set_properties(id, service_properties(name, properties))?;
        }
        Step::Unregister { name } => {
            let id = names
                .remove(name)
                .with_context(|| format!("unknown service '{}'", name))?;
            registry.unregister(id)?;
        }
        Step::Read => transcript.record(read(collection)),
    }
    Ok(())
}

fn read<E: ServiceEntry>(collection: &ServiceCollection<E>) -> Record {
    match collection.to_vec() {
        Ok(entries) => Record::Read {
            size: Some(entries.len()),
            services: entries
                .iter()
                .map(|entry| {
                    let reference = entry.service_reference();
                    service_name(reference).unwrap_or_else(|| reference.id().to_string())
                })
                .collect(),
            error: None,
        },
        Err(e) => Record::Read {
            size: None,
            services: Vec::new(),
            error: Some(e.to_string()),
        },
    }
}
