mod supabase;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use supabase::SupabaseStore;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur talking to the durable store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("store returned status {0}")]
    Status(reqwest::StatusCode),
}

/// One persisted chat line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatRecord {
    pub name: String,
    pub content: String,
}

impl ChatRecord {
    /// Derive a record from a chat payload of the form `"@name: content"`.
    ///
    /// Splits on the first `": "` and strips one leading `@` from the name.
    /// Returns `None` for payloads without the delimiter; those are dropped,
    /// not persisted.
    pub fn parse(payload: &str) -> Option<Self> {
        let (name, content) = payload.split_once(": ")?;
        Some(Self {
            name: name.strip_prefix('@').unwrap_or(name).to_string(),
            content: content.to_string(),
        })
    }
}

/// Occurrence counter for one chat content string.
///
/// Counters are keyed by the message content itself, so unrelated messages
/// with identical text share a counter. That is the upstream data model and
/// is kept as-is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CounterRecord {
    pub id: String,
    pub count: i64,
}

/// Durable store for chat history and per-content counters.
///
/// The hub treats this purely as a fallible remote dependency: every call may
/// fail, and failures are logged and abandoned rather than retried.
#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Insert one chat record into the message store.
    async fn insert_message(&self, record: &ChatRecord) -> StoreResult<()>;

    /// Look up the counter for a content string, if one exists.
    async fn find_counter(&self, id: &str) -> StoreResult<Option<CounterRecord>>;

    /// Overwrite the count of an existing counter.
    async fn update_counter(&self, id: &str, count: i64) -> StoreResult<()>;

    /// Create a counter for a content string seen for the first time.
    async fn insert_counter(&self, record: &CounterRecord) -> StoreResult<()>;
}

/// Persist one chat payload: insert the message row, then create or bump the
/// counter keyed by its content.
///
/// Best-effort by design. Every failure is logged and the operation
/// abandoned; the broadcast that carried this payload has already happened
/// and is never rolled back. The counter update only runs after a successful
/// message insert.
pub async fn persist_chat(store: &dyn ChatStore, payload: &str) {
    let record = match ChatRecord::parse(payload) {
        Some(record) => record,
        None => {
            tracing::warn!("Received malformed chat message, skipping persistence");
            return;
        }
    };

    if let Err(e) = store.insert_message(&record).await {
        tracing::warn!("Failed to insert chat message: {}", e);
        return;
    }

    match store.find_counter(&record.content).await {
        Ok(Some(counter)) => {
            if let Err(e) = store.update_counter(&record.content, counter.count + 1).await {
                tracing::warn!("Failed to update counter: {}", e);
            }
        }
        Ok(None) => {
            let counter = CounterRecord {
                id: record.content.clone(),
                count: 1,
            };
            if let Err(e) = store.insert_counter(&counter).await {
                tracing::warn!("Failed to insert counter: {}", e);
            }
        }
        Err(e) => {
            tracing::warn!("Failed to fetch counter: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[test]
    fn test_parse_strips_at_and_splits_on_first_delimiter() {
        let record = ChatRecord::parse("@bob: hi there").unwrap();
        assert_eq!(record.name, "bob");
        assert_eq!(record.content, "hi there");

        // Only the first ": " splits; the rest stays in the content.
        let record = ChatRecord::parse("@eve: a: b: c").unwrap();
        assert_eq!(record.name, "eve");
        assert_eq!(record.content, "a: b: c");
    }

    #[test]
    fn test_parse_keeps_name_without_at() {
        let record = ChatRecord::parse("carol: hey").unwrap();
        assert_eq!(record.name, "carol");
        assert_eq!(record.content, "hey");
    }

    #[test]
    fn test_parse_rejects_payload_without_delimiter() {
        assert!(ChatRecord::parse("no delimiter").is_none());
        assert!(ChatRecord::parse("").is_none());
        assert!(ChatRecord::parse("colon:but-no-space").is_none());
    }

    #[test]
    fn test_counter_record_wire_shape() {
        let json = serde_json::to_string(&CounterRecord {
            id: "42".to_string(),
            count: 2,
        })
        .unwrap();
        assert_eq!(json, r#"{"id":"42","count":2}"#);
    }

    /// In-memory store that records calls and can fail on demand.
    #[derive(Default)]
    struct RecordingStore {
        messages: Mutex<Vec<ChatRecord>>,
        counters: Mutex<HashMap<String, i64>>,
        fail_message_insert: bool,
        fail_counter_find: bool,
    }

    impl RecordingStore {
        fn counter(&self, id: &str) -> Option<i64> {
            self.counters.lock().unwrap().get(id).copied()
        }

        fn message_count(&self) -> usize {
            self.messages.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ChatStore for RecordingStore {
        async fn insert_message(&self, record: &ChatRecord) -> StoreResult<()> {
            if self.fail_message_insert {
                return Err(StoreError::Status(
                    reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                ));
            }
            self.messages.lock().unwrap().push(record.clone());
            Ok(())
        }

        async fn find_counter(&self, id: &str) -> StoreResult<Option<CounterRecord>> {
            if self.fail_counter_find {
                return Err(StoreError::Status(
                    reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                ));
            }
            Ok(self.counter(id).map(|count| CounterRecord {
                id: id.to_string(),
                count,
            }))
        }

        async fn update_counter(&self, id: &str, count: i64) -> StoreResult<()> {
            self.counters.lock().unwrap().insert(id.to_string(), count);
            Ok(())
        }

        async fn insert_counter(&self, record: &CounterRecord) -> StoreResult<()> {
            self.counters
                .lock()
                .unwrap()
                .insert(record.id.clone(), record.count);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_first_occurrence_creates_counter_at_one() {
        let store = RecordingStore::default();
        persist_chat(&store, "@a: 42").await;

        assert_eq!(store.message_count(), 1);
        assert_eq!(store.counter("42"), Some(1));
    }

    #[tokio::test]
    async fn test_repeated_content_increments_counter() {
        let store = RecordingStore::default();
        persist_chat(&store, "@a: 42").await;
        persist_chat(&store, "@b: 42").await;

        assert_eq!(store.message_count(), 2);
        assert_eq!(store.counter("42"), Some(2));
    }

    #[tokio::test]
    async fn test_distinct_contents_get_distinct_counters() {
        let store = RecordingStore::default();
        persist_chat(&store, "@a: tea").await;
        persist_chat(&store, "@a: coffee").await;

        assert_eq!(store.counter("tea"), Some(1));
        assert_eq!(store.counter("coffee"), Some(1));
    }

    #[tokio::test]
    async fn test_malformed_payload_persists_nothing() {
        let store = RecordingStore::default();
        persist_chat(&store, "no delimiter").await;

        assert_eq!(store.message_count(), 0);
        assert!(store.counters.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_message_insert_skips_counter_update() {
        let store = RecordingStore {
            fail_message_insert: true,
            ..RecordingStore::default()
        };
        persist_chat(&store, "@a: 42").await;

        assert_eq!(store.message_count(), 0);
        assert_eq!(store.counter("42"), None);
    }

    #[tokio::test]
    async fn test_failed_counter_lookup_keeps_message_row() {
        let store = RecordingStore {
            fail_counter_find: true,
            ..RecordingStore::default()
        };
        persist_chat(&store, "@a: 42").await;

        // The message insert stands; only the counter step is abandoned.
        assert_eq!(store.message_count(), 1);
        assert_eq!(store.counter("42"), None);
    }
}
