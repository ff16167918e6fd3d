//! Service Collection - 읽기 전용 동적 서비스 컬렉션
//!
//! 레지스트리에서 필터와 일치하는 서비스를 실시간으로 반영한다.
//! 소비자는 읽기만 가능하며 모든 쓰기 연산은 `UnsupportedOperation`을 반환한다.

use super::dependency::ServiceDependency;
use super::dispatch::ListenerDispatcher;
use super::dynamic::{Comparator, DynamicCollection, DynamicIter, StorageMode};
use super::reconciler::ServiceReconciler;
use super::traits::{EntryFactory, ImporterStateListener, ServiceEntry, ServiceLifecycleListener};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tether_foundation::{
    Error, ImporterConfig, ListenerId, Result, ServiceFilter, ServiceListener, ServiceReference,
    ServiceRegistry,
};
use tracing::{debug, info};

// ============================================================================
// ServiceCollection
// ============================================================================

/// 레지스트리 서비스의 동적 컬렉션
///
/// mandatory 컬렉션이 비어 있으면 모든 읽기 연산이 `ServiceUnavailable`을
/// 반환한다. 검사는 호출 시점 기준이다.
pub struct ServiceCollection<E: ServiceEntry> {
    registry: Arc<dyn ServiceRegistry>,
    storage: Arc<DynamicCollection<E>>,
    reconciler: Arc<ServiceReconciler<E>>,
    dispatcher: Arc<ListenerDispatcher<E>>,

    /// 레지스트리 구독 ID (initialize 이후 Some)
    subscription: Mutex<Option<ListenerId>>,
}

impl<E: ServiceEntry> ServiceCollection<E> {
    pub fn builder() -> ServiceCollectionBuilder<E> {
        ServiceCollectionBuilder::new()
    }

    /// 설정에서 빌더 생성
    ///
    /// 정렬 컬렉션은 `sortBy` 속성 키로, 없으면 랭킹/ID 기본 순서로 정렬한다.
    pub fn from_config(
        config: &ImporterConfig,
        registry: Arc<dyn ServiceRegistry>,
        factory: Arc<dyn EntryFactory<E>>,
    ) -> Result<ServiceCollectionBuilder<E>> {
        config.validate()?;

        let comparator: Comparator<E> = match &config.sort_by {
            Some(key) => {
                let by_key = ServiceReference::compare_by(key.clone());
                Arc::new(move |a: &E, b: &E| by_key(a.service_reference(), b.service_reference()))
            }
            None => Arc::new(|a: &E, b: &E| {
                ServiceReference::natural_order(a.service_reference(), b.service_reference())
            }),
        };

        Ok(ServiceCollectionBuilder::new()
            .bean_name(config.bean_name.clone())
            .filter(config.parsed_filter()?)
            .mandatory(config.mandatory)
            .mode(StorageMode::from_kind(config.collection, comparator))
            .registry(registry)
            .factory(factory))
    }

    // ========================================================================
    // 라이프사이클
    // ========================================================================

    /// 레지스트리 구독 시작
    ///
    /// 이미 등록된 서비스는 구독 중에 전달된다. mandatory면 구독 직후 한 번
    /// 검사하고, 일치하는 서비스가 없으면 `ServiceUnavailable`을 반환한다.
    /// 이 경우에도 구독은 유지되므로 정리는 `destroy`로 한다.
    pub fn initialize(&self) -> Result<()> {
        let mut subscription = self.subscription.lock();
        if subscription.is_some() {
            return Err(Error::IllegalState("collection already initialized".to_string()));
        }
        if self.reconciler.is_closed() {
            return Err(Error::IllegalState("collection already destroyed".to_string()));
        }

        let dependency = self.dispatcher.dependency();
        if dependency.is_mandatory() {
            info!(
                importer = dependency.bean_name(),
                filter = %dependency.filter(),
                "Looking for mandatory service"
            );
        }

        let listener: Arc<dyn ServiceListener> = self.reconciler.clone();
        let id = self
            .registry
            .add_service_listener(listener, dependency.filter().clone())?;
        *subscription = Some(id);
        drop(subscription);
        debug!(importer = dependency.bean_name(), listener_id = %id, "Subscribed to registry");

        if dependency.is_mandatory() {
            self.mandatory_check()?;
            info!(
                importer = dependency.bean_name(),
                filter = %dependency.filter(),
                "Found mandatory service"
            );
        }
        Ok(())
    }

    /// 구독 해제 후 남은 서비스를 모두 제거
    ///
    /// 각 서비스에 unbind와 해제 동작이 실행된다. 이후 컬렉션은 어떤
    /// 서비스도 받지 않는다. 제거된 서비스 수를 반환한다.
    pub fn destroy(&self) -> usize {
        if let Some(id) = self.subscription.lock().take() {
            if !self.registry.remove_service_listener(id) {
                debug!(listener_id = %id, "Registry listener was already removed");
            }
        }

        let retracted = self.reconciler.shutdown();
        debug!(
            importer = self.dispatcher.dependency().bean_name(),
            retracted, "Service collection destroyed"
        );
        retracted
    }

    pub fn is_initialized(&self) -> bool {
        self.subscription.lock().is_some()
    }

    pub fn is_destroyed(&self) -> bool {
        self.reconciler.is_closed()
    }

    // ========================================================================
    // 상태
    // ========================================================================

    /// 비어 있지 않거나 mandatory가 아니면 true
    pub fn is_satisfied(&self) -> bool {
        !self.dispatcher.dependency().is_mandatory() || !self.storage.is_empty()
    }

    pub fn dependency(&self) -> &ServiceDependency {
        self.dispatcher.dependency()
    }

    /// mandatory 컬렉션이 비어 있으면 `ServiceUnavailable`
    pub fn mandatory_check(&self) -> Result<()> {
        check_available(&self.storage, &self.dispatcher)
    }

    // ========================================================================
    // 읽기 (mandatory 검사 후)
    // ========================================================================

    pub fn len(&self) -> Result<usize> {
        self.mandatory_check()?;
        Ok(self.storage.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        self.mandatory_check()?;
        Ok(self.storage.is_empty())
    }

    pub fn contains(&self, entry: &E) -> Result<bool> {
        self.mandatory_check()?;
        Ok(self.storage.contains(entry))
    }

    pub fn contains_all(&self, entries: &[E]) -> Result<bool> {
        self.mandatory_check()?;
        Ok(self.storage.contains_all(entries))
    }

    /// 위치 조회 (정렬 컬렉션에서 유용)
    pub fn get(&self, index: usize) -> Result<Option<E>> {
        self.mandatory_check()?;
        Ok(self.storage.get(index))
    }

    /// 현재 내용의 스냅샷
    pub fn to_vec(&self) -> Result<Vec<E>> {
        self.mandatory_check()?;
        Ok(self.storage.to_vec())
    }

    /// 버퍼를 비우고 현재 내용을 복사. 복사한 개수를 반환
    pub fn to_vec_into(&self, buffer: &mut Vec<E>) -> Result<usize> {
        self.mandatory_check()?;
        Ok(self.storage.copy_into(buffer))
    }

    /// 구조 변경을 반영하는 라이브 이터레이터
    pub fn iter(&self) -> Result<ServiceIter<E>> {
        self.mandatory_check()?;
        Ok(ServiceIter {
            inner: self.storage.iter(),
            storage: Arc::clone(&self.storage),
            dispatcher: Arc::clone(&self.dispatcher),
        })
    }

    /// 내용의 문자열 표현
    pub fn describe(&self) -> Result<String> {
        self.mandatory_check()?;
        Ok(format!("{:?}", self.storage))
    }

    /// 현재 컬렉션에 있는 서비스 ID (오름차순, 검사 없음)
    pub fn service_ids(&self) -> Vec<u64> {
        self.reconciler.identities()
    }

    // ========================================================================
    // 쓰기 (항상 거부)
    // ========================================================================

    pub fn add(&self, _entry: E) -> Result<bool> {
        Err(Error::UnsupportedOperation("add"))
    }

    pub fn add_all(&self, _entries: &[E]) -> Result<bool> {
        Err(Error::UnsupportedOperation("add_all"))
    }

    pub fn remove(&self, _entry: &E) -> Result<bool> {
        Err(Error::UnsupportedOperation("remove"))
    }

    pub fn remove_all(&self, _entries: &[E]) -> Result<bool> {
        Err(Error::UnsupportedOperation("remove_all"))
    }

    pub fn retain_all(&self, _entries: &[E]) -> Result<bool> {
        Err(Error::UnsupportedOperation("retain_all"))
    }

    pub fn clear(&self) -> Result<()> {
        Err(Error::UnsupportedOperation("clear"))
    }

    // ========================================================================
    // 리스너
    // ========================================================================

    /// bind / unbind 리스너 추가 (제거는 지원하지 않음)
    pub fn add_lifecycle_listener(&self, listener: Arc<dyn ServiceLifecycleListener<E>>) {
        self.dispatcher.add_lifecycle_listener(listener);
    }

    /// satisfied / unsatisfied 리스너 추가 (제거는 지원하지 않음)
    pub fn add_state_listener(&self, listener: Arc<dyn ImporterStateListener>) {
        self.dispatcher.add_state_listener(listener);
    }

    pub fn lifecycle_listener_count(&self) -> usize {
        self.dispatcher.lifecycle_listener_count()
    }

    pub fn state_listener_count(&self) -> usize {
        self.dispatcher.state_listener_count()
    }

    /// 레지스트리 이벤트 조정기 (직접 이벤트를 주입할 때 사용)
    pub fn reconciler(&self) -> &Arc<ServiceReconciler<E>> {
        &self.reconciler
    }
}

impl<E: ServiceEntry> Drop for ServiceCollection<E> {
    fn drop(&mut self) {
        if self.subscription.get_mut().is_some() {
            self.destroy();
        }
    }
}

impl<E: ServiceEntry> fmt::Debug for ServiceCollection<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceCollection")
            .field("dependency", self.dispatcher.dependency())
            .field("mode", self.storage.mode())
            .field("size", &self.storage.len())
            .finish()
    }
}

fn check_available<E: ServiceEntry>(
    storage: &DynamicCollection<E>,
    dispatcher: &ListenerDispatcher<E>,
) -> Result<()> {
    let dependency = dispatcher.dependency();
    if dependency.is_mandatory() && storage.is_empty() {
        return Err(Error::service_unavailable(dependency.filter()));
    }
    Ok(())
}

// ============================================================================
// ServiceIter
// ============================================================================

/// 컬렉션 이터레이터
///
/// 매 단계마다 mandatory 검사를 한다. `Iterator::next`는 컬렉션이 사용
/// 불가능해지면 `None`으로 끝나며, 에러가 필요하면 `try_next`를 쓴다.
pub struct ServiceIter<E: ServiceEntry> {
    inner: DynamicIter<E>,
    storage: Arc<DynamicCollection<E>>,
    dispatcher: Arc<ListenerDispatcher<E>>,
}

impl<E: ServiceEntry> ServiceIter<E> {
    pub fn has_next(&self) -> Result<bool> {
        check_available(&self.storage, &self.dispatcher)?;
        Ok(self.inner.has_next())
    }

    pub fn try_next(&mut self) -> Result<Option<E>> {
        check_available(&self.storage, &self.dispatcher)?;
        Ok(self.inner.next())
    }

    /// 지원하지 않음
    pub fn remove(&mut self) -> Result<()> {
        self.inner.remove()
    }
}

impl<E: ServiceEntry> Iterator for ServiceIter<E> {
    type Item = E;

    fn next(&mut self) -> Option<E> {
        self.try_next().ok().flatten()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// `ServiceCollection` 빌더
pub struct ServiceCollectionBuilder<E> {
    registry: Option<Arc<dyn ServiceRegistry>>,
    factory: Option<Arc<dyn EntryFactory<E>>>,
    filter: Option<ServiceFilter>,
    bean_name: String,
    mandatory: bool,
    mode: StorageMode<E>,
    lifecycle_listeners: Vec<Arc<dyn ServiceLifecycleListener<E>>>,
    state_listeners: Vec<Arc<dyn ImporterStateListener>>,
}

impl<E: ServiceEntry> ServiceCollectionBuilder<E> {
    pub fn new() -> Self {
        Self {
            registry: None,
            factory: None,
            filter: None,
            bean_name: "serviceCollection".to_string(),
            mandatory: true,
            mode: StorageMode::List,
            lifecycle_listeners: Vec::new(),
            state_listeners: Vec::new(),
        }
    }

    pub fn registry(mut self, registry: Arc<dyn ServiceRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn factory(mut self, factory: Arc<dyn EntryFactory<E>>) -> Self {
        self.factory = Some(factory);
        self
    }

    pub fn filter(mut self, filter: ServiceFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn bean_name(mut self, name: impl Into<String>) -> Self {
        self.bean_name = name.into();
        self
    }

    pub fn mandatory(mut self, mandatory: bool) -> Self {
        self.mandatory = mandatory;
        self
    }

    pub fn mode(mut self, mode: StorageMode<E>) -> Self {
        self.mode = mode;
        self
    }

    pub fn lifecycle_listener(mut self, listener: Arc<dyn ServiceLifecycleListener<E>>) -> Self {
        self.lifecycle_listeners.push(listener);
        self
    }

    pub fn state_listener(mut self, listener: Arc<dyn ImporterStateListener>) -> Self {
        self.state_listeners.push(listener);
        self
    }

    /// 컬렉션 생성. 아직 구독하지 않은 상태로 반환된다.
    pub fn build(self) -> Result<ServiceCollection<E>> {
        let registry = self
            .registry
            .ok_or_else(|| Error::Config("service registry is required".to_string()))?;
        let factory = self
            .factory
            .ok_or_else(|| Error::Config("entry factory is required".to_string()))?;
        let filter = self
            .filter
            .ok_or_else(|| Error::Config("service filter is required".to_string()))?;

        let dispatcher = Arc::new(ListenerDispatcher::new(ServiceDependency::new(
            self.bean_name,
            filter,
            self.mandatory,
        )));
        for listener in self.lifecycle_listeners {
            dispatcher.add_lifecycle_listener(listener);
        }
        for listener in self.state_listeners {
            dispatcher.add_state_listener(listener);
        }

        let storage = Arc::new(DynamicCollection::with_mode(self.mode));
        let reconciler = Arc::new(ServiceReconciler::new(
            Arc::clone(&storage),
            factory,
            Arc::clone(&dispatcher),
        ));

        Ok(ServiceCollection {
            registry,
            storage,
            reconciler,
            dispatcher,
            subscription: Mutex::new(None),
        })
    }
}

impl<E: ServiceEntry> Default for ServiceCollectionBuilder<E> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// 테스트
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::entry::CreatedEntry;
    use crate::collection::proxy::{ProxyEntryFactory, ServiceProxy};
    use crate::collection::traits::{FnEntryFactory, ReferenceEntryFactory};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tether_foundation::{
        CollectionKind, InMemoryServiceRegistry, Properties, PropertyValue, ServiceEvent,
    };

    #[derive(Default)]
    struct Recorder {
        binds: AtomicUsize,
        unbinds: AtomicUsize,
        satisfied: AtomicUsize,
        unsatisfied: AtomicUsize,
    }

    impl Recorder {
        fn counts(&self) -> (usize, usize, usize, usize) {
            (
                self.binds.load(Ordering::SeqCst),
                self.unbinds.load(Ordering::SeqCst),
                self.satisfied.load(Ordering::SeqCst),
                self.unsatisfied.load(Ordering::SeqCst),
            )
        }
    }

    impl<E> ServiceLifecycleListener<E> for Recorder {
        fn bind(&self, _: &E, _: &ServiceReference) -> Result<()> {
            self.binds.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn unbind(&self, _: &E, _: &ServiceReference) -> Result<()> {
            self.unbinds.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    impl ImporterStateListener for Recorder {
        fn importer_satisfied(&self, _: &ServiceDependency) -> Result<()> {
            self.satisfied.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn importer_unsatisfied(&self, _: &ServiceDependency) -> Result<()> {
            self.unsatisfied.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn greeter(name: &str) -> Properties {
        let mut props = Properties::new();
        props.insert("objectClass".to_string(), PropertyValue::from("Greeter"));
        props.insert("name".to_string(), PropertyValue::from(name));
        props
    }

    fn filter() -> ServiceFilter {
        ServiceFilter::parse("(objectClass=Greeter)").unwrap()
    }

    fn collection(
        registry: &Arc<InMemoryServiceRegistry>,
        mandatory: bool,
        recorder: &Arc<Recorder>,
    ) -> ServiceCollection<ServiceReference> {
        ServiceCollection::<ServiceReference>::builder()
            .registry(registry.clone())
            .factory(Arc::new(ReferenceEntryFactory))
            .filter(filter())
            .mandatory(mandatory)
            .lifecycle_listener(recorder.clone())
            .state_listener(recorder.clone())
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_requires_collaborators() {
        let result = ServiceCollection::<ServiceReference>::builder()
            .filter(filter())
            .build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_mandatory_example_scenario() {
        let registry = Arc::new(InMemoryServiceRegistry::new());
        let recorder = Arc::new(Recorder::default());
        let released = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&released);
        let factory = FnEntryFactory::new("counting", move |r: &ServiceReference| -> Result<CreatedEntry<ServiceReference>> {
            let counter = Arc::clone(&counter);
            Ok(CreatedEntry::with_release(r.clone(), move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }))
        });
        let collection = ServiceCollection::<ServiceReference>::builder()
            .registry(registry.clone())
            .factory(Arc::new(factory))
            .filter(filter())
            .lifecycle_listener(recorder.clone())
            .state_listener(recorder.clone())
            .build()
            .unwrap();

        assert!(matches!(collection.initialize(), Err(Error::ServiceUnavailable { .. })));
        assert!(matches!(collection.len(), Err(Error::ServiceUnavailable { .. })));
        assert!(!collection.is_satisfied());

        let reference = registry.register(greeter("a"));
        assert_eq!(collection.len().unwrap(), 1);
        assert_eq!(recorder.counts(), (1, 0, 1, 0));

        // 같은 서비스가 다시 나타나도 변화 없음
        collection
            .reconciler()
            .service_changed(&ServiceEvent::registered(reference.clone()));
        assert_eq!(collection.len().unwrap(), 1);
        assert_eq!(recorder.counts(), (1, 0, 1, 0));

        registry.unregister(reference.id()).unwrap();
        assert!(matches!(collection.len(), Err(Error::ServiceUnavailable { .. })));
        assert_eq!(recorder.counts(), (1, 1, 1, 1));
        assert_eq!(released.load(Ordering::SeqCst), 1);

        collection.destroy();
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_state_transitions_only_at_boundaries() {
        let registry = Arc::new(InMemoryServiceRegistry::new());
        let recorder = Arc::new(Recorder::default());
        let collection = collection(&registry, true, &recorder);
        let _ = collection.initialize();

        let a = registry.register(greeter("a"));
        let b = registry.register(greeter("b"));
        assert_eq!(recorder.counts(), (2, 0, 1, 0));

        registry.unregister(a.id()).unwrap();
        assert_eq!(recorder.counts(), (2, 1, 1, 0));

        registry.unregister(b.id()).unwrap();
        assert_eq!(recorder.counts(), (2, 2, 1, 1));

        registry.register(greeter("c"));
        assert_eq!(recorder.counts(), (3, 2, 2, 1));
    }

    #[test]
    fn test_optional_collection_never_informs_state_listeners() {
        let registry = Arc::new(InMemoryServiceRegistry::new());
        let recorder = Arc::new(Recorder::default());
        let collection = collection(&registry, false, &recorder);
        collection.initialize().unwrap();

        assert_eq!(collection.len().unwrap(), 0);
        assert!(collection.is_empty().unwrap());
        assert!(collection.is_satisfied());

        let a = registry.register(greeter("a"));
        registry.unregister(a.id()).unwrap();
        assert_eq!(recorder.counts(), (1, 1, 0, 0));
    }

    #[test]
    fn test_initialize_picks_up_existing_services() {
        let registry = Arc::new(InMemoryServiceRegistry::new());
        registry.register(greeter("a"));
        registry.register(greeter("b"));
        let mut other = Properties::new();
        other.insert("objectClass".to_string(), PropertyValue::from("Other"));
        registry.register(other);

        let recorder = Arc::new(Recorder::default());
        let collection = collection(&registry, true, &recorder);
        collection.initialize().unwrap();

        assert_eq!(collection.len().unwrap(), 2);
        assert_eq!(collection.service_ids(), vec![1, 2]);
        assert!(collection.is_initialized());
        assert!(matches!(collection.initialize(), Err(Error::IllegalState(_))));
    }

    #[test]
    fn test_reads_and_writes() {
        let registry = Arc::new(InMemoryServiceRegistry::new());
        let recorder = Arc::new(Recorder::default());
        let collection = collection(&registry, true, &recorder);
        let _ = collection.initialize();

        // 비어 있을 때도 쓰기는 같은 에러
        assert!(matches!(collection.clear(), Err(Error::UnsupportedOperation("clear"))));

        let a = registry.register(greeter("a"));
        let b = registry.register(greeter("b"));

        assert!(collection.contains(&a).unwrap());
        assert!(collection.contains_all(&[a.clone(), b.clone()]).unwrap());
        assert_eq!(collection.to_vec().unwrap(), vec![a.clone(), b.clone()]);
        assert_eq!(collection.get(1).unwrap(), Some(b.clone()));

        let mut buffer = vec![b.clone(); 5];
        assert_eq!(collection.to_vec_into(&mut buffer).unwrap(), 2);
        assert_eq!(buffer, vec![a.clone(), b.clone()]);

        assert!(collection.describe().unwrap().contains("id: 1"));

        assert!(matches!(collection.add(a.clone()), Err(Error::UnsupportedOperation(_))));
        assert!(matches!(collection.add_all(&[a.clone()]), Err(Error::UnsupportedOperation(_))));
        assert!(matches!(collection.remove(&a), Err(Error::UnsupportedOperation(_))));
        assert!(matches!(collection.remove_all(&[a.clone()]), Err(Error::UnsupportedOperation(_))));
        assert!(matches!(collection.retain_all(&[]), Err(Error::UnsupportedOperation(_))));
        assert!(matches!(collection.clear(), Err(Error::UnsupportedOperation(_))));
        assert_eq!(collection.len().unwrap(), 2);
    }

    #[test]
    fn test_iterator_follows_changes() {
        let registry = Arc::new(InMemoryServiceRegistry::new());
        let recorder = Arc::new(Recorder::default());
        let collection = collection(&registry, true, &recorder);
        let _ = collection.initialize();

        let a = registry.register(greeter("a"));
        let mut iter = collection.iter().unwrap();
        assert_eq!(iter.try_next().unwrap(), Some(a.clone()));

        let b = registry.register(greeter("b"));
        assert!(iter.has_next().unwrap());
        assert!(matches!(iter.remove(), Err(Error::UnsupportedOperation(_))));
        assert_eq!(iter.next(), Some(b.clone()));
        assert_eq!(iter.next(), None);

        let mut iter = collection.iter().unwrap();
        registry.unregister(a.id()).unwrap();
        registry.unregister(b.id()).unwrap();
        assert!(matches!(iter.try_next(), Err(Error::ServiceUnavailable { .. })));
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn test_destroy_unbinds_and_stops_admission() {
        let registry = Arc::new(InMemoryServiceRegistry::new());
        let recorder = Arc::new(Recorder::default());
        let collection = collection(&registry, false, &recorder);
        collection.initialize().unwrap();

        registry.register(greeter("a"));
        registry.register(greeter("b"));
        assert_eq!(registry.listener_count(), 1);

        assert_eq!(collection.destroy(), 2);
        assert_eq!(recorder.counts(), (2, 2, 0, 0));
        assert_eq!(registry.listener_count(), 0);
        assert!(collection.is_destroyed());
        assert_eq!(collection.len().unwrap(), 0);

        registry.register(greeter("c"));
        assert_eq!(collection.len().unwrap(), 0);
        assert!(matches!(collection.initialize(), Err(Error::IllegalState(_))));
        assert_eq!(collection.destroy(), 0);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let registry = Arc::new(InMemoryServiceRegistry::new());
        let recorder = Arc::new(Recorder::default());
        {
            let collection = collection(&registry, false, &recorder);
            collection.initialize().unwrap();
            registry.register(greeter("a"));
        }
        assert_eq!(registry.listener_count(), 0);
        assert_eq!(recorder.counts(), (1, 1, 0, 0));
    }

    #[test]
    fn test_from_config_sorted_by_property() {
        let registry = Arc::new(InMemoryServiceRegistry::new());
        let config = ImporterConfig::new("greeters", "(objectClass=Greeter)")
            .with_mandatory(false)
            .with_collection(CollectionKind::SortedList)
            .with_sort_by("name");
        let collection = ServiceCollection::<ServiceReference>::from_config(
            &config,
            registry.clone(),
            Arc::new(ReferenceEntryFactory),
        )
        .unwrap()
        .build()
        .unwrap();
        collection.initialize().unwrap();

        registry.register(greeter("charlie"));
        registry.register(greeter("alpha"));
        registry.register(greeter("bravo"));

        let names: Vec<String> = collection
            .to_vec()
            .unwrap()
            .iter()
            .filter_map(|r| r.property("name").map(|v| v.to_string()))
            .collect();
        assert_eq!(names, vec!["alpha", "bravo", "charlie"]);
        assert_eq!(collection.dependency().bean_name(), "greeters");
    }

    #[test]
    fn test_from_config_rejects_invalid() {
        let registry = Arc::new(InMemoryServiceRegistry::new());
        let config = ImporterConfig::new("greeters", "(objectClass=Greeter").with_mandatory(false);
        let result = ServiceCollection::<ServiceReference>::from_config(
            &config,
            registry,
            Arc::new(ReferenceEntryFactory),
        );
        assert!(matches!(result, Err(Error::InvalidFilter { .. })));
    }

    #[test]
    fn test_proxies_invalidated_after_unbind() {
        let registry = Arc::new(InMemoryServiceRegistry::new());
        let collection = ServiceCollection::<ServiceProxy>::builder()
            .registry(registry.clone())
            .factory(Arc::new(ProxyEntryFactory))
            .filter(filter())
            .mandatory(false)
            .build()
            .unwrap();
        collection.initialize().unwrap();

        let reference = registry.register(greeter("a"));
        let proxy = collection.get(0).unwrap().unwrap();
        assert_eq!(proxy.invoke(|r| r.id()).unwrap(), reference.id());

        registry.unregister(reference.id()).unwrap();
        assert!(!proxy.is_valid());
        assert!(matches!(proxy.invoke(|r| r.id()), Err(Error::ServiceUnavailable { .. })));
    }
}
