//! A simple response cache.
//!
//! Positive answers are cached under their question. Every insert
//! schedules an eviction task that fires when the shortest TTL in the
//! answer runs out; a later insert for the same question replaces the
//! entry and bumps its generation, turning the stale timer into a
//! no-op. Looking an entry up returns the stored sections with every
//! TTL reduced by the time the entry has spent in the cache.
//!
//! A miss is simply `None`. It is never an error; the caller decides
//! whether to go to the network.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::time::{sleep_until, Duration, Instant};
use tracing::trace;

use crate::base::{Message, Question, Record};

//------------ Cache ---------------------------------------------------------

/// A cache of positive DNS answers.
#[derive(Clone, Debug, Default)]
pub struct Cache {
    /// The shared cache state.
    inner: Arc<Inner>,
}

/// The cache state.
#[derive(Debug, Default)]
struct Inner {
    /// Cached answers by question.
    entries: Mutex<HashMap<Question, Entry>>,
}

/// A cached answer.
#[derive(Debug)]
struct Entry {
    /// When the answer went into the cache.
    inserted: Instant,

    /// Distinguishes this entry from earlier ones under the same
    /// question, so a replaced entry's eviction timer does nothing.
    generation: u64,

    /// The answer sections as received.
    answers: Vec<Record>,

    /// The authority section as received.
    authority: Vec<Record>,

    /// The additional section as received.
    additional: Vec<Record>,
}

/// Hands out a fresh generation to every inserted entry.
static GENERATION: std::sync::atomic::AtomicU64 =
    std::sync::atomic::AtomicU64::new(0);

impl Cache {
    /// Creates a new, empty cache.
    pub fn new() -> Self {
        Default::default()
    }

    /// Looks up a question.
    ///
    /// On a hit, returns clones of the cached sections with all TTLs
    /// decremented by the whole seconds the entry has been cached,
    /// floored at zero.
    pub fn lookup(&self, question: &Question) -> Option<CachedAnswer> {
        let entries = self.inner.entries.lock();
        let entry = entries.get(question)?;
        let elapsed = entry.inserted.elapsed().as_secs();
        let age = |records: &[Record]| {
            records
                .iter()
                .map(|record| {
                    let mut record = record.clone();
                    record.ttl = record.ttl.saturating_sub(elapsed);
                    record
                })
                .collect()
        };
        Some(CachedAnswer {
            answers: age(&entry.answers),
            authority: age(&entry.authority),
            additional: age(&entry.additional),
        })
    }

    /// Inserts the answer sections of a response.
    ///
    /// An empty answer, or one whose shortest TTL is already zero, is
    /// not cached. The shortest TTL is taken over all three stored
    /// sections, and the entry evicts itself once it runs out.
    pub fn insert(&self, question: Question, response: &Message) {
        if response.answers.is_empty() {
            return;
        }
        let min_ttl = match response
            .answers
            .iter()
            .chain(&response.authority)
            .chain(&response.additional)
            .map(|record| record.ttl.as_secs())
            .min()
        {
            Some(min) if min > 0 => min,
            _ => return,
        };
        let generation = GENERATION
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        trace!(%question, min_ttl, "caching answer");
        let inserted = Instant::now();
        self.inner.entries.lock().insert(
            question.clone(),
            Entry {
                inserted,
                generation,
                answers: response.answers.clone(),
                authority: response.authority.clone(),
                additional: response.additional.clone(),
            },
        );

        // The deadline counts from the insert, not from whenever the
        // eviction task first gets polled.
        let deadline = inserted + Duration::from_secs(u64::from(min_ttl));
        let inner = self.inner.clone();
        tokio::spawn(async move {
            sleep_until(deadline).await;
            let mut entries = inner.entries.lock();
            if entries
                .get(&question)
                .map_or(false, |entry| entry.generation == generation)
            {
                trace!(%question, "evicting expired answer");
                entries.remove(&question);
            }
        });
    }

    /// Removes all entries.
    pub fn clear(&self) {
        self.inner.entries.lock().clear();
    }
}

//------------ CachedAnswer --------------------------------------------------

/// The section contents of a cached answer.
#[derive(Clone, Debug)]
pub struct CachedAnswer {
    /// The answer section.
    pub answers: Vec<Record>,

    /// The authority section.
    pub authority: Vec<Record>,

    /// The additional section.
    pub additional: Vec<Record>,
}

//============ Tests =========================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::iana::Rtype;
    use crate::base::{Name, Ttl};
    use crate::rdata::rfc1035::{Soa, A};
    use crate::rdata::RecordData;

    fn question() -> Question {
        Question::new("example.com".parse().unwrap(), Rtype::A)
    }

    fn response(ttl: u32) -> Message {
        let name: Name = "example.com".parse().unwrap();
        let mut msg = Message::default();
        msg.answers.push(Record::new(
            name,
            Ttl::from_secs(ttl),
            A::new([192, 0, 2, 1].into()).into(),
        ));
        msg
    }

    #[tokio::test(start_paused = true)]
    async fn ttl_decrements_while_cached() {
        let cache = Cache::new();
        cache.insert(question(), &response(60));

        tokio::time::advance(Duration::from_secs(1)).await;
        let hit = cache.lookup(&question()).unwrap();
        assert_eq!(hit.answers[0].ttl, Ttl::from_secs(59));

        tokio::time::advance(Duration::from_secs(30)).await;
        let hit = cache.lookup(&question()).unwrap();
        assert_eq!(hit.answers[0].ttl, Ttl::from_secs(29));
    }

    #[tokio::test(start_paused = true)]
    async fn entry_evicted_after_ttl() {
        let cache = Cache::new();
        cache.insert(question(), &response(60));
        assert!(cache.lookup(&question()).is_some());

        tokio::time::advance(Duration::from_secs(61)).await;
        // Let the eviction task run.
        tokio::task::yield_now().await;
        assert!(cache.lookup(&question()).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn reinsert_replaces_eviction_timer() {
        let cache = Cache::new();
        cache.insert(question(), &response(10));

        tokio::time::advance(Duration::from_secs(5)).await;
        // A fresh answer arrives before the first one expires.
        cache.insert(question(), &response(60));

        // The first entry's timer fires now but must not evict the
        // replacement.
        tokio::time::advance(Duration::from_secs(6)).await;
        tokio::task::yield_now().await;
        let hit = cache.lookup(&question()).unwrap();
        assert_eq!(hit.answers[0].ttl, Ttl::from_secs(54));
    }

    #[tokio::test(start_paused = true)]
    async fn eviction_uses_shortest_ttl_across_sections() {
        let name: Name = "example.com".parse().unwrap();
        let mut msg = response(60);
        msg.authority.push(Record::new(
            name.clone(),
            Ttl::from_secs(30),
            RecordData::Soa(Soa {
                mname: name.clone(),
                rname: "hostmaster.example.com".parse().unwrap(),
                serial: 1,
                refresh: 3600,
                retry: 600,
                expire: 86400,
                minimum: 30,
            }),
        ));

        let cache = Cache::new();
        cache.insert(question(), &msg);

        // The authority record's TTL bounds the entry's lifetime.
        tokio::time::advance(Duration::from_secs(29)).await;
        tokio::task::yield_now().await;
        assert!(cache.lookup(&question()).is_some());

        tokio::time::advance(Duration::from_secs(2)).await;
        tokio::task::yield_now().await;
        assert!(cache.lookup(&question()).is_none());
    }

    #[tokio::test]
    async fn zero_ttl_and_empty_answers_not_cached() {
        let cache = Cache::new();
        cache.insert(question(), &response(0));
        assert!(cache.lookup(&question()).is_none());

        cache.insert(question(), &Message::default());
        assert!(cache.lookup(&question()).is_none());
    }

    #[tokio::test]
    async fn lookup_is_case_insensitive() {
        let cache = Cache::new();
        cache.insert(question(), &response(60));
        let other =
            Question::new("EXAMPLE.COM".parse().unwrap(), Rtype::A);
        assert!(cache.lookup(&other).is_some());
    }
}
