//! Leaderboards
//!
//! Two ranked lists: a local top 10 kept in the key-value store and a remote
//! top 100 behind whatever service the host wires in. A score enters a list
//! while the list has room or when it beats the last entry.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::persistence::{KeyValueStore, StoreError};
use crate::settings::Role;

/// Entries kept on the local list
pub const LOCAL_CAPACITY: usize = 10;

/// Entries kept on the remote list
pub const REMOTE_CAPACITY: usize = 100;

/// Which list a record goes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Board {
    Local,
    Remote,
}

/// One finished game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub name: String,
    pub score: u64,
    pub role: Role,
    /// Host clock (ms since the Unix epoch in the shipped hosts)
    pub time_ms: u64,
}

/// A bounded list sorted by descending score
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordList {
    entries: Vec<Record>,
    capacity: usize,
}

impl RecordList {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity,
        }
    }

    /// Sort and trim whatever a store handed back
    pub fn from_records(mut records: Vec<Record>, capacity: usize) -> Self {
        records.sort_by(|a, b| b.score.cmp(&a.score));
        records.truncate(capacity);
        Self {
            entries: records,
            capacity,
        }
    }

    pub fn entries(&self) -> &[Record] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<Record> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn qualifies(&self, score: u64) -> bool {
        qualifies(score, &self.entries, self.capacity)
    }

    pub fn rank_of(&self, score: u64) -> Option<usize> {
        rank_of(score, &self.entries, self.capacity)
    }

    /// Insert a qualifying record; returns its 1-based rank
    pub fn insert(&mut self, record: Record) -> Option<usize> {
        let rank = self.rank_of(record.score)?;
        self.entries.insert(rank - 1, record);
        self.entries.truncate(self.capacity);
        Some(rank)
    }
}

/// Room left, or strictly better than the last entry of a full list.
/// `list` must be sorted by descending score.
pub fn qualifies(score: u64, list: &[Record], capacity: usize) -> bool {
    if list.len() < capacity {
        return true;
    }
    list.get(capacity.saturating_sub(1))
        .is_some_and(|last| score > last.score)
}

/// 1-based position `score` would take, None if it does not qualify
pub fn rank_of(score: u64, list: &[Record], capacity: usize) -> Option<usize> {
    if !qualifies(score, list, capacity) {
        return None;
    }
    let pos = list.iter().position(|e| score > e.score);
    Some(pos.unwrap_or(list.len()) + 1)
}

/// Where finished games are ranked
pub trait LeaderboardStore {
    /// Best `n` local records, highest first
    fn local_top(&self, n: usize) -> Result<Vec<Record>, StoreError>;
    /// Best `n` remote records, highest first
    fn remote_top(&self, n: usize) -> Result<Vec<Record>, StoreError>;
    fn submit_record(&mut self, record: &Record, board: Board) -> Result<(), StoreError>;
}

/// No leaderboards at all
pub struct NoLeaderboard;

impl LeaderboardStore for NoLeaderboard {
    fn local_top(&self, _n: usize) -> Result<Vec<Record>, StoreError> {
        Err(StoreError::Unavailable("no local leaderboard".into()))
    }

    fn remote_top(&self, _n: usize) -> Result<Vec<Record>, StoreError> {
        Err(StoreError::Unavailable("no remote leaderboard".into()))
    }

    fn submit_record(&mut self, _record: &Record, _board: Board) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("no leaderboard".into()))
    }
}

/// Local list in a key-value store. There is no remote service behind it.
pub struct LocalLeaderboard<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> LocalLeaderboard<S> {
    const STORAGE_KEY: &'static str = "topList";

    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The stored list; unreadable data counts as empty
    pub fn load(&self) -> RecordList {
        match self.store.get_json::<Vec<Record>>(Self::STORAGE_KEY) {
            Ok(Some(records)) => RecordList::from_records(records, LOCAL_CAPACITY),
            Ok(None) => RecordList::new(LOCAL_CAPACITY),
            Err(e) => {
                log::warn!("Discarding unreadable local leaderboard: {}", e);
                RecordList::new(LOCAL_CAPACITY)
            }
        }
    }

    fn save(&mut self, list: &RecordList) -> Result<(), StoreError> {
        self.store.set_json(Self::STORAGE_KEY, &list.entries())?;
        log::info!("Local leaderboard saved ({} entries)", list.len());
        Ok(())
    }
}

impl<S: KeyValueStore> LeaderboardStore for LocalLeaderboard<S> {
    fn local_top(&self, n: usize) -> Result<Vec<Record>, StoreError> {
        Ok(self.load().into_entries().into_iter().take(n).collect())
    }

    fn remote_top(&self, _n: usize) -> Result<Vec<Record>, StoreError> {
        Err(StoreError::Unavailable("no remote leaderboard configured".into()))
    }

    fn submit_record(&mut self, record: &Record, board: Board) -> Result<(), StoreError> {
        match board {
            Board::Local => {
                let mut list = self.load();
                if list.insert(record.clone()).is_some() {
                    self.save(&list)?;
                }
                Ok(())
            }
            Board::Remote => Err(StoreError::Unavailable(
                "no remote leaderboard configured".into(),
            )),
        }
    }
}

const NAME_ANIMALS: [&str; 12] = [
    "Kitten", "Puppy", "Mouse", "Calf", "Tiger", "Bunny", "Dragon", "Snake", "Pony", "Lamb",
    "Monkey", "Piglet",
];

/// Placeholder name offered when asking for a record holder's name
pub fn default_name(rng: &mut impl Rng) -> String {
    let animal = NAME_ANIMALS[rng.random_range(0..NAME_ANIMALS.len())];
    format!("Nameless {animal}")
}

/// Coarse age of a record for list display
pub fn format_age(now_ms: u64, time_ms: u64) -> String {
    let mins = now_ms.saturating_sub(time_ms) / 60_000;
    let hours = mins / 60;
    let days = hours / 24;

    match (days, hours, mins) {
        (1, _, _) => "Yesterday".to_string(),
        (d, _, _) if d > 1 => format!("{d} days ago"),
        (_, 1, _) => "1 hour ago".to_string(),
        (_, h, _) if h > 1 => format!("{h} hours ago"),
        (_, _, 1) => "1 min ago".to_string(),
        (_, _, m) if m > 1 => format!("{m} mins ago"),
        _ => "Just now".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn record(name: &str, score: u64) -> Record {
        Record {
            name: name.to_string(),
            score,
            role: Role::Boy,
            time_ms: 0,
        }
    }

    fn full_list(capacity: usize) -> RecordList {
        let records = (0..capacity as u64).map(|i| record("x", 100 + i)).collect();
        RecordList::from_records(records, capacity)
    }

    #[test]
    fn test_short_list_always_qualifies() {
        let list = RecordList::new(LOCAL_CAPACITY);
        assert!(list.qualifies(0));
        assert_eq!(list.rank_of(0), Some(1));
    }

    #[test]
    fn test_full_list_needs_to_beat_last() {
        let list = full_list(LOCAL_CAPACITY);
        assert_eq!(list.entries().last().map(|r| r.score), Some(100));
        assert!(!list.qualifies(100));
        assert!(list.qualifies(101));
        assert_eq!(list.rank_of(101), Some(10));
        assert_eq!(list.rank_of(500), Some(1));
    }

    #[test]
    fn test_insert_keeps_order_and_capacity() {
        let mut list = full_list(3);
        assert_eq!(list.insert(record("new", 101)), Some(3));
        assert_eq!(list.len(), 3);
        assert_eq!(
            list.entries().iter().map(|r| r.score).collect::<Vec<_>>(),
            vec![102, 101, 101]
        );
        assert_eq!(list.insert(record("low", 1)), None);
    }

    #[test]
    fn test_rank_of_plain_slice() {
        let list = full_list(3).into_entries();
        assert_eq!(rank_of(150, &list, 3), Some(1));
        assert_eq!(rank_of(100, &list, 3), None);
        // A bigger board still has room
        assert_eq!(rank_of(100, &list, 10), Some(4));
        assert!(qualifies(0, &[], REMOTE_CAPACITY));
    }

    #[test]
    fn test_ties_rank_after_existing() {
        let mut list = RecordList::new(5);
        list.insert(record("first", 50));
        assert_eq!(list.insert(record("second", 50)), Some(2));
        assert_eq!(list.entries()[0].name, "first");
    }

    #[test]
    fn test_local_leaderboard_persists() {
        let mut board = LocalLeaderboard::new(MemoryStore::new());
        board.submit_record(&record("a", 30), Board::Local).unwrap();
        board.submit_record(&record("b", 70), Board::Local).unwrap();

        let top = board.local_top(LOCAL_CAPACITY).unwrap();
        assert_eq!(top.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(), vec!["b", "a"]);
        assert!(board.remote_top(REMOTE_CAPACITY).is_err());
        assert!(board.submit_record(&record("c", 1), Board::Remote).is_err());

        // Survives a reload from the same store
        let reloaded = LocalLeaderboard::new(board.store().clone());
        assert_eq!(reloaded.load().entries()[0].score, 70);
    }

    #[test]
    fn test_default_name_is_nameless() {
        let mut rng = Pcg32::seed_from_u64(1);
        assert!(default_name(&mut rng).starts_with("Nameless "));
    }

    #[test]
    fn test_format_age() {
        let min = 60_000;
        assert_eq!(format_age(30_000, 0), "Just now");
        assert_eq!(format_age(min, 0), "1 min ago");
        assert_eq!(format_age(5 * min, 0), "5 mins ago");
        assert_eq!(format_age(61 * min, 0), "1 hour ago");
        assert_eq!(format_age(25 * 60 * min, 0), "Yesterday");
        assert_eq!(format_age(72 * 60 * min, 0), "3 days ago");
    }
}
