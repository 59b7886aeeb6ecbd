use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use rand::seq::IteratorRandom;
use thiserror::Error as ThisError;
use tokio::time::{Duration, Instant};

/// Keys sampled per active-expiration pass.
const SWEEP_SAMPLE_SIZE: usize = 20;

/// A sweep pass repeats while more than this fraction of sampled keys turned
/// out to be expired.
const SWEEP_REPEAT_THRESHOLD: f64 = 0.25;

/// The Store manages key-value pairs with optional time-to-live settings for
/// each key. Expired keys are removed lazily whenever an operation touches
/// them, and proactively by [`Store::sweep_expired`], which an external
/// scheduler is expected to invoke on a fixed cadence. The store is designed
/// to be thread-safe, shared and cloned cheaply using reference counting.
#[derive(Clone)]
pub struct Store {
    inner: Arc<Mutex<State>>,
}

struct State {
    keys: HashMap<String, Entry>,
}

struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// What a key holds. Type mismatches surface as [`StoreError::WrongType`]
/// instead of run-time inspection of an untyped value.
pub enum Value {
    Str(String),
    List(VecDeque<String>),
}

#[derive(Debug, ThisError, PartialEq)]
pub enum StoreError {
    #[error("key not found")]
    NotFound,
    #[error("value is not an integer or out of range")]
    NotInteger,
    #[error("operation against a key holding the wrong kind of value")]
    WrongType,
}

impl Store {
    pub fn new() -> Store {
        let state = State {
            keys: HashMap::new(),
        };

        Store {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    pub fn lock(&self) -> StoreGuard<'_> {
        StoreGuard {
            state: self.inner.lock().unwrap(),
        }
    }

    /// One active-expiration cycle: sample [`SWEEP_SAMPLE_SIZE`] distinct keys
    /// uniformly at random, delete the expired ones, and repeat while the
    /// expired fraction stays above [`SWEEP_REPEAT_THRESHOLD`]. Keyspaces
    /// smaller than the sample size are left to lazy expiration. The lock is
    /// released between passes so concurrent clients are not starved.
    pub fn sweep_expired(&self) {
        loop {
            let expired = {
                let mut guard = self.lock();

                if guard.state.keys.len() < SWEEP_SAMPLE_SIZE {
                    return;
                }

                let sampled: Vec<String> = guard
                    .state
                    .keys
                    .keys()
                    .choose_multiple(&mut rand::thread_rng(), SWEEP_SAMPLE_SIZE)
                    .into_iter()
                    .cloned()
                    .collect();

                let now = Instant::now();
                let mut expired = 0;
                for key in &sampled {
                    let is_expired = guard
                        .state
                        .keys
                        .get(key)
                        .is_some_and(|entry| entry.is_expired(now));
                    if is_expired {
                        guard.state.keys.remove(key);
                        expired += 1;
                    }
                }

                expired
            };

            if (expired as f64) / (SWEEP_SAMPLE_SIZE as f64) <= SWEEP_REPEAT_THRESHOLD {
                return;
            }
        }
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

/// A locked view of the store. All operations are linearizable with respect
/// to each other; the guard holds the single coarse lock for its lifetime.
pub struct StoreGuard<'a> {
    state: MutexGuard<'a, State>,
}

impl<'a> StoreGuard<'a> {
    /// Removes the entry if its expiry has passed and returns the key's live
    /// entry, if any. Every read path goes through here, which is what makes
    /// expiration lazy.
    fn live_entry(&mut self, key: &str) -> Option<&mut Entry> {
        let expired = self
            .state
            .keys
            .get(key)
            .is_some_and(|entry| entry.is_expired(Instant::now()));

        if expired {
            self.state.keys.remove(key);
        }

        self.state.keys.get_mut(key)
    }

    pub fn get(&mut self, key: &str) -> Result<String, StoreError> {
        match self.live_entry(key) {
            Some(entry) => match &entry.value {
                Value::Str(s) => Ok(s.clone()),
                Value::List(_) => Err(StoreError::WrongType),
            },
            None => Err(StoreError::NotFound),
        }
    }

    /// Unconditional overwrite; any prior expiry is cleared.
    pub fn set(&mut self, key: String, value: String) {
        let entry = Entry {
            value: Value::Str(value),
            expires_at: None,
        };
        self.state.keys.insert(key, entry);
    }

    pub fn set_with_ttl(&mut self, key: String, value: String, ttl: Duration) {
        let entry = Entry {
            value: Value::Str(value),
            expires_at: Some(Instant::now() + ttl),
        };
        self.state.keys.insert(key, entry);
    }

    pub fn exists(&mut self, key: &str) -> bool {
        self.live_entry(key).is_some()
    }

    /// Removes the key regardless of value type. Returns whether a live entry
    /// was actually removed; an already-expired entry counts as absent.
    pub fn remove(&mut self, key: &str) -> bool {
        if self.live_entry(key).is_none() {
            return false;
        }
        self.state.keys.remove(key);
        true
    }

    /// Adds `delta` to the integer stored at `key`, treating an absent key as
    /// zero, and writes the result back as text. The write-back is a full
    /// overwrite, so an existing expiry is cleared.
    pub fn incr_by(&mut self, key: &str, delta: i64) -> Result<i64, StoreError> {
        let current = match self.live_entry(key) {
            Some(entry) => match &entry.value {
                Value::Str(s) => s.parse::<i64>().map_err(|_| StoreError::NotInteger)?,
                Value::List(_) => return Err(StoreError::NotInteger),
            },
            None => 0,
        };

        let next = current.checked_add(delta).ok_or(StoreError::NotInteger)?;
        self.set(key.to_string(), next.to_string());

        Ok(next)
    }

    pub fn push_front(&mut self, key: &str, element: String) -> Result<usize, StoreError> {
        let list = self.live_list(key)?;
        list.push_front(element);
        Ok(list.len())
    }

    pub fn push_back(&mut self, key: &str, element: String) -> Result<usize, StoreError> {
        let list = self.live_list(key)?;
        list.push_back(element);
        Ok(list.len())
    }

    /// Returns the `[start, end)` slice of the list at `key`. Negative `start`
    /// counts from the back; negative `end` counts from the back inclusively,
    /// so `range(key, 0, -1)` is the whole list. An absent key behaves as an
    /// empty list.
    pub fn range(&mut self, key: &str, start: i64, end: i64) -> Result<Vec<String>, StoreError> {
        let list = match self.live_entry(key) {
            Some(entry) => match &entry.value {
                Value::List(list) => list,
                Value::Str(_) => return Err(StoreError::WrongType),
            },
            None => return Ok(Vec::new()),
        };

        let len = list.len() as i64;
        let from = if start < 0 {
            (len + start).max(0)
        } else {
            start.min(len)
        };
        let to = if end < 0 {
            (len + end + 1).max(0)
        } else {
            end.min(len)
        };

        if from >= to {
            return Ok(Vec::new());
        }

        Ok(list
            .iter()
            .skip(from as usize)
            .take((to - from) as usize)
            .cloned()
            .collect())
    }

    pub fn len(&self) -> usize {
        self.state.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.keys.is_empty()
    }

    /// The list at `key`, created empty if the key is absent. A key holding a
    /// string is a type mismatch.
    fn live_list(&mut self, key: &str) -> Result<&mut VecDeque<String>, StoreError> {
        // Drop an expired entry first so it reads as absent.
        self.live_entry(key);

        let entry = self
            .state
            .keys
            .entry(key.to_string())
            .or_insert_with(|| Entry {
                value: Value::List(VecDeque::new()),
                expires_at: None,
            });

        match &mut entry.value {
            Value::List(list) => Ok(list),
            Value::Str(_) => Err(StoreError::WrongType),
        }
    }
}
