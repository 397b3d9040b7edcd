// ── Rule store ──
//
// Ordered list of installed selection rules. List position is the
// default rank; `ranked()` yields the evaluation order.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;
use tracing::info;

use crate::error::CoreError;
use crate::model::{InstalledRule, Rule, RuleId};

pub struct RuleStore {
    rules: ArcSwap<Vec<Arc<InstalledRule>>>,
    next_id: AtomicU32,
    writer: Mutex<()>,
}

impl RuleStore {
    pub fn new() -> Self {
        Self {
            rules: ArcSwap::from_pointee(Vec::new()),
            next_id: AtomicU32::new(1),
            writer: Mutex::new(()),
        }
    }

    /// Append a rule (lowest index is tried first).
    pub fn add(&self, rule: Rule) -> Result<RuleId, CoreError> {
        self.insert(usize::MAX, rule)
    }

    /// Insert a rule at list position `idx`; positions past the end append.
    pub fn insert(&self, idx: usize, rule: Rule) -> Result<RuleId, CoreError> {
        rule.validate()?;
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

        let id = RuleId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let installed = Arc::new(InstalledRule { id, rule });
        let mut position = idx;

        self.rules.rcu(|current| {
            let mut next = Vec::clone(current);
            position = idx.min(next.len());
            next.insert(position, Arc::clone(&installed));
            next
        });

        info!(%id, idx = position, rule = %installed.rule, "rule added");
        Ok(id)
    }

    /// Remove the rule at list position `idx`.
    pub fn remove(&self, idx: usize) -> Result<Arc<InstalledRule>, CoreError> {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

        let current = self.rules.load_full();
        let removed = current
            .get(idx)
            .cloned()
            .ok_or(CoreError::RuleNotFound { idx })?;

        let mut next = Vec::clone(&current);
        next.remove(idx);
        self.rules.store(Arc::new(next));

        info!(id = %removed.id, idx, "rule removed");
        Ok(removed)
    }

    /// Drop every rule.
    pub fn clear(&self) {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let removed = self.rules.swap(Arc::new(Vec::new()));
        if !removed.is_empty() {
            info!(count = removed.len(), "rules cleared");
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.load().is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.load().len()
    }

    /// Rules in list order.
    pub fn list(&self) -> Arc<Vec<Arc<InstalledRule>>> {
        self.rules.load_full()
    }

    pub fn get(&self, idx: usize) -> Option<Arc<InstalledRule>> {
        self.rules.load().get(idx).cloned()
    }

    /// Rules in evaluation order: `(rank, index)` ascending.
    pub fn ranked(&self) -> Vec<RankedRule> {
        ranked(&self.rules.load())
    }
}

impl Default for RuleStore {
    fn default() -> Self {
        Self::new()
    }
}

/// A rule paired with its effective rank and list position.
#[derive(Debug, Clone)]
pub struct RankedRule {
    pub rank: u32,
    pub idx: usize,
    pub rule: Arc<InstalledRule>,
}

/// Order a rule list for evaluation.
pub fn ranked(rules: &[Arc<InstalledRule>]) -> Vec<RankedRule> {
    let mut ranked: Vec<RankedRule> = rules
        .iter()
        .enumerate()
        .map(|(idx, installed)| RankedRule {
            rank: installed.rule.rank(idx),
            idx,
            rule: Arc::clone(installed),
        })
        .collect();
    ranked.sort_by_key(|r| (r.rank, r.idx));
    ranked
}
