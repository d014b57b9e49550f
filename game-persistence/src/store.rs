use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredMember {
    pub member: String,
    pub score: i64,
}

/// Capability interface over the hosting platform's key-value store.
/// Plain get/set round-trips are not atomic; mutation of whole records goes
/// through `set_nx` (create-if-absent guards) or `compare_and_swap`
/// (optimistic per-key retry loops). Sorted-set operations are atomic.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Write only if the key does not exist. Returns true when this call
    /// created the key.
    async fn set_nx(&self, key: &str, value: &str) -> Result<bool>;

    /// Write only if the current value equals `expected` (`None` meaning the
    /// key is absent). Returns true when the write happened.
    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&str>,
        value: &str,
    ) -> Result<bool>;

    async fn del(&self, key: &str) -> Result<()>;

    /// Upsert a member's score in a sorted set.
    async fn zadd(&self, key: &str, member: &str, score: i64) -> Result<()>;

    /// Rank range over a sorted set, inclusive on both ends; negative
    /// indices count from the end. `reverse` orders by descending score.
    /// Ties order by ascending member in both directions, so equal scores
    /// rank deterministically.
    async fn zrange(
        &self,
        key: &str,
        start: i64,
        stop: i64,
        reverse: bool,
    ) -> Result<Vec<ScoredMember>>;

    /// 0-based rank of `member` in descending-score order, `None` if absent.
    async fn zrev_rank(&self, key: &str, member: &str) -> Result<Option<u64>>;

    async fn zrem(&self, key: &str, members: &[String]) -> Result<()>;
}

#[derive(Default)]
struct MemoryInner {
    strings: HashMap<String, String>,
    sorted_sets: HashMap<String, HashMap<String, i64>>,
}

/// In-memory `KvStore` used for development and tests, in place of the
/// hosting platform's store.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn sorted_members(set: &HashMap<String, i64>, reverse: bool) -> Vec<ScoredMember> {
        let mut members: Vec<ScoredMember> = set
            .iter()
            .map(|(member, score)| ScoredMember {
                member: member.clone(),
                score: *score,
            })
            .collect();
        members.sort_by(|a, b| {
            let by_score = if reverse {
                b.score.cmp(&a.score)
            } else {
                a.score.cmp(&b.score)
            };
            by_score.then_with(|| a.member.cmp(&b.member))
        });
        members
    }

    fn resolve_range(len: usize, start: i64, stop: i64) -> Option<(usize, usize)> {
        let len = len as i64;
        let clamp = |index: i64| -> i64 {
            if index < 0 { len + index } else { index }
        };
        let start = clamp(start).max(0);
        let stop = clamp(stop).min(len - 1);
        if start > stop || start >= len {
            return None;
        }
        Some((start as usize, stop as usize))
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let inner = self.inner.read().await;
        Ok(inner.strings.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.strings.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn set_nx(&self, key: &str, value: &str) -> Result<bool> {
        let mut inner = self.inner.write().await;
        if inner.strings.contains_key(key) {
            return Ok(false);
        }
        inner.strings.insert(key.to_string(), value.to_string());
        Ok(true)
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&str>,
        value: &str,
    ) -> Result<bool> {
        let mut inner = self.inner.write().await;
        if inner.strings.get(key).map(String::as_str) != expected {
            return Ok(false);
        }
        inner.strings.insert(key.to_string(), value.to_string());
        Ok(true)
    }

    async fn del(&self, key: &str) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.strings.remove(key);
        inner.sorted_sets.remove(key);
        Ok(())
    }

    async fn zadd(&self, key: &str, member: &str, score: i64) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner
            .sorted_sets
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string(), score);
        Ok(())
    }

    async fn zrange(
        &self,
        key: &str,
        start: i64,
        stop: i64,
        reverse: bool,
    ) -> Result<Vec<ScoredMember>> {
        let inner = self.inner.read().await;
        let Some(set) = inner.sorted_sets.get(key) else {
            return Ok(Vec::new());
        };
        let members = Self::sorted_members(set, reverse);
        let Some((start, stop)) = Self::resolve_range(members.len(), start, stop) else {
            return Ok(Vec::new());
        };
        Ok(members[start..=stop].to_vec())
    }

    async fn zrev_rank(&self, key: &str, member: &str) -> Result<Option<u64>> {
        let inner = self.inner.read().await;
        let Some(set) = inner.sorted_sets.get(key) else {
            return Ok(None);
        };
        let rank = Self::sorted_members(set, true)
            .iter()
            .position(|entry| entry.member == member)
            .map(|position| position as u64);
        Ok(rank)
    }

    async fn zrem(&self, key: &str, members: &[String]) -> Result<()> {
        let mut inner = self.inner.write().await;
        if let Some(set) = inner.sorted_sets.get_mut(key) {
            for member in members {
                set.remove(member);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_nx_only_creates_once() {
        let store = MemoryStore::new();

        assert!(store.set_nx("k", "first").await.unwrap());
        assert!(!store.set_nx("k", "second").await.unwrap());
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("first"));
    }

    #[tokio::test]
    async fn compare_and_swap_rejects_stale_writes() {
        let store = MemoryStore::new();

        // Creating against an absent key.
        assert!(store.compare_and_swap("k", None, "v1").await.unwrap());
        // Stale expectation loses.
        assert!(!store.compare_and_swap("k", None, "v2").await.unwrap());
        assert!(!store.compare_and_swap("k", Some("old"), "v2").await.unwrap());
        // Matching expectation wins.
        assert!(store.compare_and_swap("k", Some("v1"), "v2").await.unwrap());
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v2"));
    }

    #[tokio::test]
    async fn zrange_orders_by_score_with_member_tiebreak() {
        let store = MemoryStore::new();
        store.zadd("lb", "carol", 5).await.unwrap();
        store.zadd("lb", "alice", 10).await.unwrap();
        store.zadd("lb", "bob", 10).await.unwrap();

        let descending = store.zrange("lb", 0, -1, true).await.unwrap();
        let order: Vec<&str> = descending.iter().map(|m| m.member.as_str()).collect();
        // Equal scores order by ascending member.
        assert_eq!(order, vec!["alice", "bob", "carol"]);

        let ascending = store.zrange("lb", 0, -1, false).await.unwrap();
        assert_eq!(ascending[0].member, "carol");
    }

    #[tokio::test]
    async fn zrange_respects_rank_bounds() {
        let store = MemoryStore::new();
        for (member, score) in [("a", 1), ("b", 2), ("c", 3), ("d", 4)] {
            store.zadd("lb", member, score).await.unwrap();
        }

        let top_two = store.zrange("lb", 0, 1, true).await.unwrap();
        assert_eq!(top_two.len(), 2);
        assert_eq!(top_two[0].member, "d");

        let empty = store.zrange("lb", 10, 20, true).await.unwrap();
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn zadd_upserts_the_score() {
        let store = MemoryStore::new();
        store.zadd("lb", "alice", 1).await.unwrap();
        store.zadd("lb", "alice", 7).await.unwrap();

        let members = store.zrange("lb", 0, -1, true).await.unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].score, 7);
    }

    #[tokio::test]
    async fn zrev_rank_is_zero_based_and_none_when_absent() {
        let store = MemoryStore::new();
        store.zadd("lb", "alice", 10).await.unwrap();
        store.zadd("lb", "bob", 5).await.unwrap();

        assert_eq!(store.zrev_rank("lb", "alice").await.unwrap(), Some(0));
        assert_eq!(store.zrev_rank("lb", "bob").await.unwrap(), Some(1));
        assert_eq!(store.zrev_rank("lb", "nobody").await.unwrap(), None);
    }

    #[tokio::test]
    async fn zrem_removes_members() {
        let store = MemoryStore::new();
        store.zadd("lb", "alice", 10).await.unwrap();
        store.zadd("lb", "bob", 5).await.unwrap();

        store.zrem("lb", &["alice".to_string()]).await.unwrap();
        let members = store.zrange("lb", 0, -1, true).await.unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].member, "bob");
    }
}
