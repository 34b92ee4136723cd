//! Per-session nickname cache.
//!
//! Absence of a key means "no nickname assigned". An empty nickname arriving
//! on any channel removes the key, so the map never holds empty strings.
//! The last update applied for a key wins, whichever channel delivered it.


use dashmap::DashMap;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::info;
use tracing::trace;

use crate::IdentityKey;

/// One element of a nickname listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NicknameEntry {
    pub key: IdentityKey,
    pub nickname: String,
}

impl NicknameEntry {
    pub fn new(
        key: IdentityKey,
        nickname: impl Into<String>,
    ) -> Self {
        Self {
            key,
            nickname: nickname.into(),
        }
    }
}

/// Listing message as pushed by the remote side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NicknameList {
    /// Every listed key is removed, whatever its nickname text
    pub removal: bool,
    /// Delta against earlier listings rather than an initial listing
    pub incremental: bool,
    pub entries: Vec<NicknameEntry>,
}

/// Exported view of a cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NicknameRecord {
    #[serde(rename = "SteamID64", with = "key_as_string")]
    pub key: IdentityKey,
    #[serde(rename = "Name")]
    pub name: String,
}

impl NicknameRecord {
    pub fn new(
        key: IdentityKey,
        name: impl Into<String>,
    ) -> Self {
        Self {
            key,
            name: name.into(),
        }
    }
}

mod key_as_string {
    use serde::de::Error as _;
    use serde::Deserialize;
    use serde::Deserializer;
    use serde::Serializer;

    use crate::IdentityKey;

    pub fn serialize<S: Serializer>(
        key: &IdentityKey,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&key.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<IdentityKey, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(D::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointChangeOutcome {
    Set,
    Removed,
}

#[derive(Debug, Default)]
pub struct NicknameStore {
    entries: DashMap<IdentityKey, String>,
}

impl NicknameStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies an authoritative listing for the listed keys only.
    ///
    /// Keys missing from `entries` are left alone; eviction needs an explicit
    /// empty nickname.
    pub fn apply_snapshot(
        &self,
        entries: &[NicknameEntry],
    ) {
        for entry in entries {
            self.set_or_remove(entry.key, &entry.nickname);
        }
        trace!(count = entries.len(), "applied nickname snapshot");
    }

    /// Applies a full listing message, honoring its removal flag.
    pub fn apply_list(
        &self,
        list: &NicknameList,
    ) {
        debug!(
            removal = list.removal,
            incremental = list.incremental,
            count = list.entries.len(),
            "nickname list received"
        );

        if list.removal {
            for entry in &list.entries {
                self.remove(&entry.key);
            }
        } else {
            self.apply_snapshot(&list.entries);
        }
    }

    /// Applies a single-key change. `is_echo` marks a change this session
    /// caused itself; it only affects logging.
    pub fn apply_point_change(
        &self,
        key: IdentityKey,
        nickname: &str,
        is_echo: bool,
    ) -> PointChangeOutcome {
        let outcome = self.set_or_remove(key, nickname);
        if !is_echo {
            // another client changed it
            info!("{} = {}", key.render(), nickname);
        }
        outcome
    }

    pub fn lookup(
        &self,
        key: &IdentityKey,
    ) -> Option<String> {
        self.entries.get(key).map(|nickname| nickname.value().clone())
    }

    pub fn remove(
        &self,
        key: &IdentityKey,
    ) -> Option<String> {
        self.entries.remove(key).map(|(_, nickname)| nickname)
    }

    /// Sorted by key.
    pub fn entries(&self) -> Vec<NicknameRecord> {
        let mut records: Vec<NicknameRecord> = self
            .entries
            .iter()
            .map(|entry| NicknameRecord::new(*entry.key(), entry.value().clone()))
            .collect();
        records.sort_by_key(|record| record.key);
        records
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    fn set_or_remove(
        &self,
        key: IdentityKey,
        nickname: &str,
    ) -> PointChangeOutcome {
        if nickname.is_empty() {
            self.entries.remove(&key);
            PointChangeOutcome::Removed
        } else {
            self.entries.insert(key, nickname.to_string());
            PointChangeOutcome::Set
        }
    }
}
