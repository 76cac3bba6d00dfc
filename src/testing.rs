//! In-memory doubles for the counter store and the word repository.

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::{Duration, Instant},
};

use async_trait::async_trait;

use crate::{
    database::{CounterStore, StoreError},
    error::AppError,
    models::{Definition, SearchPage, Word},
    search::WordRepository,
};

enum Slot {
    Counter(i64),
    Bytes(Vec<u8>),
}

struct Entry {
    slot: Slot,
    deadline: Option<Instant>,
}

/// Counter store double with real TTL semantics. Time is advanced
/// explicitly (`advance`) instead of sleeping through windows, and each
/// operation class can be told to fail to exercise the degraded paths.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
    skew: Arc<Mutex<Duration>>,
    fail_incrs: Arc<AtomicBool>,
    fail_gets: Arc<AtomicBool>,
    fail_sets: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretends `elapsed` wall-clock time has passed, expiring entries.
    pub fn advance(&self, elapsed: Duration) {
        *self.skew.lock().unwrap() += elapsed;
    }

    pub fn fail_incrs(&self, fail: bool) {
        self.fail_incrs.store(fail, Ordering::SeqCst);
    }

    pub fn fail_gets(&self, fail: bool) {
        self.fail_gets.store(fail, Ordering::SeqCst);
    }

    pub fn fail_sets(&self, fail: bool) {
        self.fail_sets.store(fail, Ordering::SeqCst);
    }

    fn now(&self) -> Instant {
        Instant::now() + *self.skew.lock().unwrap()
    }
}

fn expired(entry: &Entry, now: Instant) -> bool {
    entry.deadline.is_some_and(|deadline| deadline <= now)
}

#[async_trait]
impl CounterStore for MemoryStore {
    async fn incr(&self, key: &str) -> Result<i64, StoreError> {
        if self.fail_incrs.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("increment refused"));
        }

        let now = self.now();
        let mut entries = self.entries.lock().unwrap();
        let entry = entries.entry(key.to_string()).or_insert(Entry {
            slot: Slot::Counter(0),
            deadline: None,
        });

        if expired(entry, now) {
            *entry = Entry {
                slot: Slot::Counter(0),
                deadline: None,
            };
        }

        match &mut entry.slot {
            Slot::Counter(count) => {
                *count += 1;
                Ok(*count)
            }
            Slot::Bytes(_) => Err(StoreError::Unavailable("INCR on non-integer value")),
        }
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        let now = self.now();
        let mut entries = self.entries.lock().unwrap();

        match entries.get_mut(key) {
            Some(entry) if !expired(entry, now) => {
                entry.deadline = Some(now + ttl);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        if self.fail_gets.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("read refused"));
        }

        let now = self.now();
        let entries = self.entries.lock().unwrap();

        match entries.get(key) {
            Some(entry) if !expired(entry, now) => match &entry.slot {
                Slot::Bytes(bytes) => Ok(Some(bytes.clone())),
                Slot::Counter(count) => Ok(Some(count.to_string().into_bytes())),
            },
            _ => Ok(None),
        }
    }

    async fn set_bytes(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), StoreError> {
        if self.fail_sets.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("write refused"));
        }

        let now = self.now();
        let mut entries = self.entries.lock().unwrap();
        entries.insert(
            key.to_string(),
            Entry {
                slot: Slot::Bytes(value.to_vec()),
                deadline: Some(now + ttl),
            },
        );

        Ok(())
    }
}

/// Word repository double over a fixed list, counting offset fetches so
/// tests can tell cache hits from recomputations.
#[derive(Clone)]
pub struct MemoryRepository {
    words: Arc<Vec<Word>>,
    fetches: Arc<AtomicUsize>,
}

impl MemoryRepository {
    pub fn with_words(count: usize) -> Self {
        let words = (0..count).map(sample_word).collect();

        Self {
            words: Arc::new(words),
            fetches: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WordRepository for MemoryRepository {
    async fn count(&self) -> Result<i64, AppError> {
        Ok(self.words.len() as i64)
    }

    async fn fetch_at_offset(&self, offset: i64) -> Result<Option<Word>, AppError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        Ok(usize::try_from(offset)
            .ok()
            .and_then(|offset| self.words.get(offset).cloned()))
    }

    async fn fetch_by_id(&self, id: &str) -> Result<Option<Word>, AppError> {
        Ok(self.words.iter().find(|word| word.id == id).cloned())
    }

    async fn search(&self, term: &str, page: i64, limit: i64) -> Result<SearchPage, AppError> {
        let matches: Vec<Word> = self
            .words
            .iter()
            .filter(|word| word.word.contains(term))
            .cloned()
            .collect();
        let total_count = matches.len() as i64;

        let start = ((page - 1) * limit).max(0) as usize;
        let words = matches.into_iter().skip(start).take(limit as usize).collect();

        Ok(SearchPage { words, total_count })
    }
}

pub fn sample_word(n: usize) -> Word {
    Word {
        id: format!("word-{n}"),
        word: format!("word{n}"),
        definitions: vec![Definition {
            meaning: format!("meaning of word {n}"),
            part_of_speech: Some("noun".to_string()),
            examples: Vec::new(),
        }],
        length: 5,
        ..Default::default()
    }
}
