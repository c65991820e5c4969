//! Per-key debounced commits.
//!
//! Every `schedule` call replaces the pending value for its key and restarts
//! that key's timer. The commit callback fires once the key has been quiet
//! for the configured delay, or immediately on `flush`.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::deck::EditorField;
use crate::store::Store;

type Commit<K, V> = Arc<dyn Fn(K, V) + Send + Sync>;

struct Pending<V> {
    value: V,
    generation: u64,
    handle: JoinHandle<()>,
}

struct Shared<K, V> {
    pending: HashMap<K, Pending<V>>,
    next_generation: u64,
}

pub struct Debouncer<K, V> {
    delay: Duration,
    commit: Commit<K, V>,
    shared: Arc<Mutex<Shared<K, V>>>,
}

impl<K, V> Debouncer<K, V>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + Send + 'static,
{
    pub fn new<F>(delay: Duration, commit: F) -> Self
    where
        F: Fn(K, V) + Send + Sync + 'static,
    {
        Self {
            delay,
            commit: Arc::new(commit),
            shared: Arc::new(Mutex::new(Shared { pending: HashMap::new(), next_generation: 0 })),
        }
    }

    /// Record a new value for `key` and restart its timer.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule(&self, key: K, value: V) {
        let mut shared = lock(&*self.shared);
        let generation = shared.next_generation;
        shared.next_generation += 1;

        let handle = {
            let shared_ref = Arc::clone(&self.shared);
            let commit = Arc::clone(&self.commit);
            let delay = self.delay;
            let key = key.clone();
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                let fired = {
                    let mut shared = lock(&*shared_ref);
                    match shared.pending.get(&key) {
                        Some(p) if p.generation == generation => {
                            shared.pending.remove(&key).map(|p| p.value)
                        }
                        _ => None,
                    }
                };
                if let Some(value) = fired {
                    commit(key, value);
                }
            })
        };

        if let Some(previous) = shared.pending.insert(key, Pending { value, generation, handle }) {
            previous.handle.abort();
        }
    }

    /// Commit the pending value for `key` right now, if there is one.
    pub fn flush(&self, key: &K) -> bool {
        let taken = lock(&*self.shared).pending.remove(key);
        match taken {
            Some(pending) => {
                pending.handle.abort();
                (self.commit)(key.clone(), pending.value);
                true
            }
            None => false,
        }
    }

    pub fn flush_all(&self) {
        let drained: Vec<(K, Pending<V>)> = lock(&*self.shared).pending.drain().collect();
        for (key, pending) in drained {
            pending.handle.abort();
            (self.commit)(key, pending.value);
        }
    }

    /// Drop every pending value without committing.
    pub fn cancel_all(&self) {
        for (_, pending) in lock(&*self.shared).pending.drain() {
            pending.handle.abort();
        }
    }

    pub fn pending_count(&self) -> usize {
        lock(&*self.shared).pending.len()
    }
}

impl<K, V> Drop for Debouncer<K, V> {
    fn drop(&mut self) {
        if let Ok(mut shared) = self.shared.lock() {
            for (_, pending) in shared.pending.drain() {
                pending.handle.abort();
            }
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    match m.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Debouncer that writes editor fields of one slide into the store.
pub fn field_autosave(store: Store, slide_id: String, delay: Duration) -> Debouncer<EditorField, String> {
    Debouncer::new(delay, move |field: EditorField, value: String| {
        let patch = field.patch(value);
        store.update(|s| s.with_slide_update(&slide_id, &patch));
        tracing::debug!("autosaved {field:?} of slide {slide_id}");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::AppState;
    use bioslide_common::Slide;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn recorder() -> (Arc<Mutex<Vec<(u8, String)>>>, impl Fn(u8, String) + Send + Sync + 'static) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        (log, move |k: u8, v: String| sink.lock().unwrap().push((k, v)))
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_edits_commit_once_with_the_last_value() {
        let (log, commit) = recorder();
        let debouncer = Debouncer::new(Duration::from_millis(500), commit);

        for value in ["K", "Ko", "Kom"] {
            debouncer.schedule(1, value.to_string());
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert!(log.lock().unwrap().is_empty());

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(*log.lock().unwrap(), vec![(1, "Kom".to_string())]);
        assert_eq!(debouncer.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn keys_have_independent_timers() {
        let (log, commit) = recorder();
        let debouncer = Debouncer::new(Duration::from_millis(500), commit);

        debouncer.schedule(1, "title".to_string());
        tokio::time::sleep(Duration::from_millis(300)).await;
        debouncer.schedule(2, "content".to_string());
        tokio::time::sleep(Duration::from_millis(250)).await;

        assert_eq!(*log.lock().unwrap(), vec![(1, "title".to_string())]);
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(log.lock().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn flush_commits_immediately_and_cancels_the_timer() {
        let (log, commit) = recorder();
        let debouncer = Debouncer::new(Duration::from_millis(500), commit);

        debouncer.schedule(1, "draft".to_string());
        assert!(debouncer.flush(&1));
        assert!(!debouncer.flush(&1));
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(*log.lock().unwrap(), vec![(1, "draft".to_string())]);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_all_drops_pending_values() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let debouncer = Debouncer::new(Duration::from_millis(10), move |_: u8, _: String| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        debouncer.schedule(1, "a".into());
        debouncer.schedule(2, "b".into());
        debouncer.cancel_all();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn autosave_writes_the_field_into_the_store() {
        let store = Store::with_state(
            AppState::default().with_slides(vec![Slide::new("1", "A", "a"), Slide::new("2", "B", "b")]),
        );
        let autosave = field_autosave(store.clone(), "2".into(), Duration::from_millis(500));

        autosave.schedule(EditorField::Content, "b1".into());
        autosave.schedule(EditorField::Content, "b12".into());
        tokio::time::sleep(Duration::from_millis(499)).await;
        assert_eq!(store.snapshot().slides[1].content, "b");

        tokio::time::sleep(Duration::from_millis(10)).await;
        let state = store.snapshot();
        assert_eq!(state.slides[1].content, "b12");
        assert_eq!(state.slides[0].content, "a");
        assert_eq!(state.slides[1].title, "B");
    }
}
