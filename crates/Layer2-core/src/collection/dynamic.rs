//! Dynamic Collection - 순회 중 변경 가능한 thread-safe 저장소
//!
//! 반복자(iterator)는 생성 이후의 구조 변경을 반영한다.
//!
//! - 커서 뒤에 추가된 항목은 보인다
//! - 커서 앞에 삽입된 항목은 다시 방문하지 않는다 (커서가 함께 이동)
//! - 커서에 도달하기 전에 제거된 항목은 건너뛴다
//! - 동시 변경으로 인한 실패는 없다

use parking_lot::RwLock;
use std::cmp::Ordering;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::{Arc, Weak};
use tether_foundation::{CollectionKind, Error, Result};

/// 정렬 저장소에서 사용하는 비교자
pub type Comparator<E> = Arc<dyn Fn(&E, &E) -> Ordering + Send + Sync>;

// ============================================================================
// StorageMode
// ============================================================================

/// 저장소 동작 방식
pub enum StorageMode<E> {
    /// 삽입 순서, 추가는 항상 성공
    List,

    /// 삽입 순서, 같은 값이 이미 있으면 추가 거부
    Set,

    /// 비교자 순서, 같은 값은 기존 항목 뒤에 삽입
    SortedList(Comparator<E>),

    /// 비교자 순서, 비교 결과가 같은 항목이 있으면 추가 거부
    SortedSet(Comparator<E>),
}

impl<E> StorageMode<E> {
    /// 설정의 저장소 종류와 비교자로 생성
    pub fn from_kind(kind: CollectionKind, comparator: Comparator<E>) -> Self {
        match kind {
            CollectionKind::List => Self::List,
            CollectionKind::Set => Self::Set,
            CollectionKind::SortedList => Self::SortedList(comparator),
            CollectionKind::SortedSet => Self::SortedSet(comparator),
        }
    }

    pub fn kind(&self) -> CollectionKind {
        match self {
            Self::List => CollectionKind::List,
            Self::Set => CollectionKind::Set,
            Self::SortedList(_) => CollectionKind::SortedList,
            Self::SortedSet(_) => CollectionKind::SortedSet,
        }
    }
}

impl<E> Clone for StorageMode<E> {
    fn clone(&self) -> Self {
        match self {
            Self::List => Self::List,
            Self::Set => Self::Set,
            Self::SortedList(cmp) => Self::SortedList(Arc::clone(cmp)),
            Self::SortedSet(cmp) => Self::SortedSet(Arc::clone(cmp)),
        }
    }
}

impl<E> fmt::Debug for StorageMode<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StorageMode::{}", self.kind())
    }
}

// ============================================================================
// Storage (락 내부 상태)
// ============================================================================

struct Storage<E> {
    items: Vec<E>,

    /// 살아있는 반복자의 커서. 반복자가 drop되면 다음 쓰기 때 정리된다.
    cursors: Vec<Weak<AtomicUsize>>,
}

impl<E> Storage<E> {
    fn insert_at(&mut self, index: usize, item: E) {
        self.items.insert(index, item);
        self.cursors.retain(|weak| match weak.upgrade() {
            Some(cursor) => {
                let position = cursor.load(AtomicOrdering::SeqCst);
                if index < position {
                    cursor.store(position + 1, AtomicOrdering::SeqCst);
                }
                true
            }
            None => false,
        });
    }

    fn remove_at(&mut self, index: usize) -> E {
        let removed = self.items.remove(index);
        self.cursors.retain(|weak| match weak.upgrade() {
            Some(cursor) => {
                let position = cursor.load(AtomicOrdering::SeqCst);
                if index < position {
                    cursor.store(position - 1, AtomicOrdering::SeqCst);
                }
                true
            }
            None => false,
        });
        removed
    }

    fn clear(&mut self) {
        self.items.clear();
        self.cursors.retain(|weak| match weak.upgrade() {
            Some(cursor) => {
                cursor.store(0, AtomicOrdering::SeqCst);
                true
            }
            None => false,
        });
    }
}

// ============================================================================
// DynamicCollection
// ============================================================================

/// 순회 중 확장/축소 가능한 thread-safe 순서 컬렉션
///
/// 모든 구조 변경은 내부 락 하나로 직렬화된다. 읽기끼리는 서로 막지 않지만
/// 한 단계를 수행하는 동안 구조 변경과는 배타적이다.
///
/// 중복 검사는 호출자 책임이다 (`Set`/`SortedSet` 모드의 값 비교 제외).
pub struct DynamicCollection<E> {
    storage: Arc<RwLock<Storage<E>>>,
    mode: StorageMode<E>,
}

impl<E: Clone + PartialEq> DynamicCollection<E> {
    /// 삽입 순서 리스트 생성
    pub fn new() -> Self {
        Self::with_mode(StorageMode::List)
    }

    pub fn with_mode(mode: StorageMode<E>) -> Self {
        Self {
            storage: Arc::new(RwLock::new(Storage {
                items: Vec::new(),
                cursors: Vec::new(),
            })),
            mode,
        }
    }

    pub fn mode(&self) -> &StorageMode<E> {
        &self.mode
    }

    // ========================================================================
    // 쓰기
    // ========================================================================

    /// 항목 추가. 구조가 실제로 바뀌었으면 true
    pub fn append(&self, item: E) -> bool {
        let mut storage = self.storage.write();
        match &self.mode {
            StorageMode::List => {
                let end = storage.items.len();
                storage.insert_at(end, item);
                true
            }
            StorageMode::Set => {
                if storage.items.contains(&item) {
                    return false;
                }
                let end = storage.items.len();
                storage.insert_at(end, item);
                true
            }
            StorageMode::SortedList(cmp) => {
                let index = storage
                    .items
                    .partition_point(|existing| cmp(existing, &item) != Ordering::Greater);
                storage.insert_at(index, item);
                true
            }
            StorageMode::SortedSet(cmp) => {
                match storage.items.binary_search_by(|existing| cmp(existing, &item)) {
                    Ok(_) => false,
                    Err(index) => {
                        storage.insert_at(index, item);
                        true
                    }
                }
            }
        }
    }

    /// 같은 값의 첫 항목 제거. 찾아서 제거했으면 true
    pub fn remove_one(&self, item: &E) -> bool {
        let mut storage = self.storage.write();
        match storage.items.iter().position(|existing| existing == item) {
            Some(index) => {
                storage.remove_at(index);
                true
            }
            None => false,
        }
    }

    /// 위치로 제거
    pub fn remove_at(&self, index: usize) -> Option<E> {
        let mut storage = self.storage.write();
        if index < storage.items.len() {
            Some(storage.remove_at(index))
        } else {
            None
        }
    }

    /// 전체 제거. 살아있는 반복자는 처음 위치로 돌아간다.
    pub fn clear(&self) {
        self.storage.write().clear();
    }

    // ========================================================================
    // 읽기
    // ========================================================================

    pub fn len(&self) -> usize {
        self.storage.read().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.read().items.is_empty()
    }

    pub fn contains(&self, item: &E) -> bool {
        self.storage.read().items.contains(item)
    }

    pub fn contains_all(&self, items: &[E]) -> bool {
        let storage = self.storage.read();
        items.iter().all(|item| storage.items.contains(item))
    }

    pub fn get(&self, index: usize) -> Option<E> {
        self.storage.read().items.get(index).cloned()
    }

    /// 현재 내용의 스냅샷
    pub fn to_vec(&self) -> Vec<E> {
        self.storage.read().items.clone()
    }

    /// 주어진 버퍼를 재사용해 스냅샷 복사. 복사된 개수 반환
    pub fn copy_into(&self, buffer: &mut Vec<E>) -> usize {
        let storage = self.storage.read();
        buffer.clear();
        buffer.extend(storage.items.iter().cloned());
        buffer.len()
    }

    /// 라이브 반복자 생성
    pub fn iter(&self) -> DynamicIter<E> {
        let cursor = Arc::new(AtomicUsize::new(0));
        let mut storage = self.storage.write();
        storage.cursors.retain(|weak| weak.strong_count() > 0);
        storage.cursors.push(Arc::downgrade(&cursor));
        drop(storage);
        DynamicIter {
            storage: Arc::clone(&self.storage),
            cursor,
        }
    }

    /// 살아있는 반복자 수
    pub fn iterator_count(&self) -> usize {
        self.storage
            .read()
            .cursors
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }
}

impl<E: Clone + PartialEq> Default for DynamicCollection<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: fmt::Debug> fmt::Debug for DynamicCollection<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let storage = self.storage.read();
        f.debug_list().entries(storage.items.iter()).finish()
    }
}

// ============================================================================
// DynamicIter
// ============================================================================

/// 구조 변경을 반영하는 라이브 반복자
pub struct DynamicIter<E> {
    storage: Arc<RwLock<Storage<E>>>,
    cursor: Arc<AtomicUsize>,
}

impl<E: Clone> DynamicIter<E> {
    /// 다음 항목이 있는지 (이 시점 기준)
    pub fn has_next(&self) -> bool {
        let storage = self.storage.read();
        self.cursor.load(AtomicOrdering::SeqCst) < storage.items.len()
    }

    /// 현재 커서 위치
    pub fn position(&self) -> usize {
        self.cursor.load(AtomicOrdering::SeqCst)
    }

    /// 읽기 전용 컬렉션이므로 항상 실패
    pub fn remove(&mut self) -> Result<()> {
        Err(Error::UnsupportedOperation("iterator.remove"))
    }
}

impl<E: Clone> Iterator for DynamicIter<E> {
    type Item = E;

    fn next(&mut self) -> Option<E> {
        let storage = self.storage.read();
        let position = self.cursor.load(AtomicOrdering::SeqCst);
        let item = storage.items.get(position).cloned()?;
        self.cursor.store(position + 1, AtomicOrdering::SeqCst);
        Some(item)
    }
}

// ============================================================================
// 테스트
// ============================================================================
