// ── Traffic counters ──
//
// Per-NI transmission counters. Increments lock one DashMap shard for a
// handful of instructions; snapshots copy each record under its shard
// read lock, so no record is ever observed half-updated.

use std::collections::BTreeMap;

use dashmap::DashMap;
use serde::Serialize;
use strum::{Display, EnumIter, EnumString};

use crate::error::CoreError;
use crate::model::{NetId, Nid};

/// Which counter an event bumps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum CounterKind {
    Send,
    Recv,
    Drop,
    Error,
}

/// Counters of one local NI. Every field is monotone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NiCounters {
    pub send_count: u64,
    pub recv_count: u64,
    pub drop_count: u64,
    pub error_count: u64,
}

impl NiCounters {
    pub fn get(&self, kind: CounterKind) -> u64 {
        match kind {
            CounterKind::Send => self.send_count,
            CounterKind::Recv => self.recv_count,
            CounterKind::Drop => self.drop_count,
            CounterKind::Error => self.error_count,
        }
    }

    fn bump(&mut self, kind: CounterKind) {
        let slot = match kind {
            CounterKind::Send => &mut self.send_count,
            CounterKind::Recv => &mut self.recv_count,
            CounterKind::Drop => &mut self.drop_count,
            CounterKind::Error => &mut self.error_count,
        };
        *slot = slot.saturating_add(1);
    }

    fn add(&mut self, other: &Self) {
        self.send_count += other.send_count;
        self.recv_count += other.recv_count;
        self.drop_count += other.drop_count;
        self.error_count += other.error_count;
    }

    /// Field-wise `self - before`, clamped at zero for NIs that were reset.
    pub fn since(&self, before: &Self) -> Self {
        Self {
            send_count: self.send_count.saturating_sub(before.send_count),
            recv_count: self.recv_count.saturating_sub(before.recv_count),
            drop_count: self.drop_count.saturating_sub(before.drop_count),
            error_count: self.error_count.saturating_sub(before.error_count),
        }
    }
}

/// Live counter table keyed by local NID.
#[derive(Default)]
pub struct TrafficCounters {
    table: DashMap<Nid, NiCounters>,
}

impl TrafficCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start counting for a local NI. Existing counts are kept.
    pub fn register(&self, nid: Nid) {
        self.table.entry(nid).or_default();
    }

    /// Forget every NI of `net`.
    pub fn unregister_net(&self, net: NetId) {
        self.table.retain(|nid, _| nid.net != net);
    }

    pub fn clear(&self) {
        self.table.clear();
    }

    /// Count one event on a local NI.
    pub fn increment(&self, nid: &Nid, kind: CounterKind) -> Result<(), CoreError> {
        let mut entry = self
            .table
            .get_mut(nid)
            .ok_or_else(|| CoreError::UnknownNetwork {
                identifier: nid.to_string(),
            })?;
        entry.bump(kind);
        Ok(())
    }

    /// Copy the whole table.
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            nis: self
                .table
                .iter()
                .map(|entry| (*entry.key(), *entry.value()))
                .collect(),
        }
    }
}

/// Immutable copy of the counter table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CounterSnapshot {
    nis: BTreeMap<Nid, NiCounters>,
}

impl CounterSnapshot {
    pub fn ni(&self, nid: &Nid) -> Option<NiCounters> {
        self.nis.get(nid).copied()
    }

    /// Sum over every NI of `net`.
    pub fn network(&self, net: NetId) -> NiCounters {
        self.nis
            .iter()
            .filter(|(nid, _)| nid.net == net)
            .fold(NiCounters::default(), |mut acc, (_, c)| {
                acc.add(c);
                acc
            })
    }

    /// Per-network sums, ordered by network id.
    pub fn networks(&self) -> BTreeMap<NetId, NiCounters> {
        let mut out: BTreeMap<NetId, NiCounters> = BTreeMap::new();
        for (nid, c) in &self.nis {
            out.entry(nid.net).or_default().add(c);
        }
        out
    }

    pub fn total(&self) -> NiCounters {
        self.nis.values().fold(NiCounters::default(), |mut acc, c| {
            acc.add(c);
            acc
        })
    }

    /// Change since `before`, NI by NI. NIs absent from `before` count from zero.
    pub fn delta(&self, before: &Self) -> Self {
        Self {
            nis: self
                .nis
                .iter()
                .map(|(nid, now)| {
                    let then = before.nis.get(nid).copied().unwrap_or_default();
                    (*nid, now.since(&then))
                })
                .collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Nid, &NiCounters)> {
        self.nis.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.nis.is_empty()
    }
}
