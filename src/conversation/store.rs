// In-memory stores for conversations and the estimates produced from them

use crate::models::{ConversationRecord, StoredEstimate};
use crate::utils::{generate_id, read_recover, write_recover};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;

/// Default number of conversations (and of stored estimates) kept in memory
pub const DEFAULT_MAX_ENTRIES: usize = 1000;

/// Shared handle to one conversation. Holding its lock serializes every
/// operation on that conversation.
pub type ConversationHandle = Arc<Mutex<ConversationRecord>>;

/// Map that forgets its oldest entry once it holds `capacity` keys.
/// Re-inserting a key counts as new.
struct BoundedMap<V> {
    entries: HashMap<String, V>,
    order: VecDeque<String>,
    capacity: usize,
}

impl<V> BoundedMap<V> {
    fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Insert, returning the replaced value and any evicted entries
    fn insert(&mut self, key: String, value: V) -> (Option<V>, Vec<(String, V)>) {
        let replaced = self.remove(&key);

        let mut evicted = Vec::new();
        while self.entries.len() >= self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            if let Some(value) = self.entries.remove(&oldest) {
                evicted.push((oldest, value));
            }
        }

        self.order.push_back(key.clone());
        self.entries.insert(key, value);
        (replaced, evicted)
    }

    fn remove(&mut self, key: &str) -> Option<V> {
        let value = self.entries.remove(key)?;
        self.order.retain(|k| k != key);
        Some(value)
    }

    fn get(&self, key: &str) -> Option<&V> {
        self.entries.get(key)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Keyed conversation records.
///
/// The outer lock only guards handle lookup and insertion and is never held
/// across an await; each record carries its own async mutex. Once full, the
/// oldest conversation is dropped to make room.
pub struct ConversationStore {
    records: RwLock<BoundedMap<ConversationHandle>>,
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MAX_ENTRIES)
    }
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: RwLock::new(BoundedMap::new(capacity)),
        }
    }

    /// Start a conversation with fresh conversation and project IDs
    pub fn create(&self) -> ConversationRecord {
        let record = ConversationRecord::new(generate_id(), generate_id());
        let snapshot = record.clone();

        let (_, evicted) = write_recover(&self.records)
            .insert(record.id.clone(), Arc::new(Mutex::new(record)));
        for (id, _) in evicted {
            log::info!("Conversation store full, dropped conversation {}", id);
        }
        log::info!(
            "Started conversation {} for project {}",
            snapshot.id,
            snapshot.project_id
        );
        snapshot
    }

    /// Get the handle for a conversation
    pub fn get(&self, id: &str) -> Option<ConversationHandle> {
        read_recover(&self.records).get(id).cloned()
    }

    /// Clone the current state of a conversation
    pub async fn snapshot(&self, id: &str) -> Option<ConversationRecord> {
        let handle = self.get(id)?;
        let record = handle.lock().await;
        Some(record.clone())
    }

    /// Forget a conversation. Operations already holding its handle finish
    /// normally.
    pub fn remove(&self, id: &str) -> Option<ConversationHandle> {
        write_recover(&self.records).remove(id)
    }

    pub fn len(&self) -> usize {
        read_recover(&self.records).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Latest estimate per project ID, oldest project dropped first once full
pub struct EstimateStore {
    by_project: RwLock<BoundedMap<Arc<StoredEstimate>>>,
}

impl Default for EstimateStore {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MAX_ENTRIES)
    }
}

impl EstimateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            by_project: RwLock::new(BoundedMap::new(capacity)),
        }
    }

    /// Store an estimate, replacing any earlier one for the same project
    pub fn insert(&self, stored: StoredEstimate) -> Arc<StoredEstimate> {
        let stored = Arc::new(stored);
        let (previous, evicted) = write_recover(&self.by_project)
            .insert(stored.estimate.project_id.clone(), stored.clone());

        if let Some(previous) = previous {
            log::debug!(
                "Replaced estimate {} for project {} with {}",
                previous.id,
                stored.estimate.project_id,
                stored.id
            );
        }
        for (project_id, _) in evicted {
            log::info!("Estimate store full, dropped estimate for project {}", project_id);
        }
        stored
    }

    pub fn get(&self, project_id: &str) -> Option<Arc<StoredEstimate>> {
        read_recover(&self.by_project).get(project_id).cloned()
    }

    pub fn remove(&self, project_id: &str) -> Option<Arc<StoredEstimate>> {
        write_recover(&self.by_project).remove(project_id)
    }

    pub fn len(&self) -> usize {
        read_recover(&self.by_project).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimation::{analyze, AnalysisRequest};
    use crate::models::{ConversationStep, Task, TaskDecomposition};
    use chrono::{NaiveDate, Utc};

    fn stored(project_id: &str, id: &str) -> StoredEstimate {
        let request = AnalysisRequest::new(
            project_id,
            TaskDecomposition {
                tasks: vec![Task::new("A", "A", 1.0, 1.0, 1.0)],
                project_summary: None,
            },
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        );
        StoredEstimate {
            id: id.to_string(),
            conversation_id: "conv".to_string(),
            created_at: Utc::now(),
            estimate: analyze(&request).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_create_and_snapshot() {
        let store = ConversationStore::new();
        let record = store.create();
        assert_ne!(record.id, record.project_id);
        assert_eq!(store.len(), 1);

        let snapshot = store.snapshot(&record.id).await.unwrap();
        assert_eq!(snapshot.current_step, ConversationStep::Greeting);
        assert!(store.snapshot("missing").await.is_none());
    }

    #[tokio::test]
    async fn test_handle_mutations_are_visible() {
        let store = ConversationStore::new();
        let id = store.create().id;

        {
            let handle = store.get(&id).unwrap();
            let mut record = handle.lock().await;
            record.apply_user_message("An inventory system").unwrap();
        }

        let snapshot = store.snapshot(&id).await.unwrap();
        assert_eq!(snapshot.current_step, ConversationStep::Details);
    }

    #[tokio::test]
    async fn test_concurrent_messages_on_one_conversation_serialize() {
        let store = Arc::new(ConversationStore::new());
        let id = store.create().id;

        let mut joins = Vec::new();
        for i in 0..3 {
            let store = store.clone();
            let id = id.clone();
            joins.push(tokio::spawn(async move {
                let handle = store.get(&id).unwrap();
                let mut record = handle.lock().await;
                record.apply_user_message(&format!("answer {}", i)).unwrap();
            }));
        }
        for join in joins {
            join.await.unwrap();
        }

        let snapshot = store.snapshot(&id).await.unwrap();
        assert_eq!(snapshot.current_step, ConversationStep::ReadyForAnalysis);
        // greeting + 3 user + 3 assistant, no interleaving lost
        assert_eq!(snapshot.messages.len(), 7);
    }

    #[test]
    fn test_estimate_store_replaces_per_project() {
        let store = EstimateStore::new();
        store.insert(stored("proj-1", "est-1"));
        store.insert(stored("proj-2", "est-2"));
        store.insert(stored("proj-1", "est-3"));

        assert_eq!(store.len(), 2);
        assert_eq!(store.get("proj-1").unwrap().id, "est-3");
        assert!(store.get("proj-3").is_none());
    }

    #[test]
    fn test_conversation_store_drops_oldest_when_full() {
        let store = ConversationStore::with_capacity(2);
        let first = store.create().id;
        let second = store.create().id;
        let third = store.create().id;

        assert_eq!(store.len(), 2);
        assert!(store.get(&first).is_none());
        assert!(store.get(&second).is_some());
        assert!(store.get(&third).is_some());
    }

    #[test]
    fn test_remove_frees_entries() {
        let conversations = ConversationStore::new();
        let id = conversations.create().id;
        assert!(conversations.remove(&id).is_some());
        assert!(conversations.is_empty());
        assert!(conversations.remove(&id).is_none());

        let estimates = EstimateStore::new();
        estimates.insert(stored("proj-1", "est-1"));
        assert_eq!(estimates.remove("proj-1").unwrap().id, "est-1");
        assert!(estimates.is_empty());
    }

    #[test]
    fn test_estimate_store_replacement_refreshes_age() {
        let store = EstimateStore::with_capacity(2);
        store.insert(stored("proj-1", "est-1"));
        store.insert(stored("proj-2", "est-2"));
        store.insert(stored("proj-1", "est-3"));
        store.insert(stored("proj-3", "est-4"));

        assert_eq!(store.len(), 2);
        assert!(store.get("proj-2").is_none());
        assert_eq!(store.get("proj-1").unwrap().id, "est-3");
    }
}
