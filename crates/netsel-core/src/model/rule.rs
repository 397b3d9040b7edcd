// ── User-defined selection policy (UDSP) types ──

use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{Display, EnumString};

use crate::error::CoreError;

use super::nid::Nid;
use super::selector::Selector;

/// Stable identifier handed out by the rule store. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(pub u32);

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a matching rule does to a route candidate.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RuleAction {
    /// Move the candidate ahead of unpreferred ones, ordered by rank.
    #[default]
    Prefer,
    /// Drop the candidate entirely.
    Exclude,
}

/// A selection rule as supplied by `udsp add` or the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Matches the local NID a candidate would send from.
    pub src: Selector,
    /// Matches the peer NID a candidate would send to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dst: Option<Selector>,
    /// Explicit rank; 0 is the highest. Defaults to the rule's list index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,
    #[serde(default)]
    pub action: RuleAction,
}

impl Rule {
    pub fn prefer(src: Selector) -> Self {
        Self {
            src,
            dst: None,
            priority: None,
            action: RuleAction::Prefer,
        }
    }

    pub fn exclude(src: Selector) -> Self {
        Self {
            action: RuleAction::Exclude,
            ..Self::prefer(src)
        }
    }

    pub fn with_dst(mut self, dst: Selector) -> Self {
        self.dst = Some(dst);
        self
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Parse the `--src` / `--dst` pair of the command-line form.
    pub fn parse(src: &str, dst: Option<&str>) -> Result<Self, CoreError> {
        let rule = Self::prefer(src.parse()?);
        match dst {
            Some(dst) => Ok(rule.with_dst(dst.parse()?)),
            None => Ok(rule),
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.action == RuleAction::Exclude && self.priority.is_some() {
            return Err(CoreError::invalid_rule(
                "exclude rules cannot carry a priority",
            ));
        }
        Ok(())
    }

    /// Whether this rule applies to sending from `local` to `remote`.
    pub fn matches(&self, local: &Nid, remote: &Nid) -> bool {
        self.src.matches(local) && self.dst.as_ref().is_none_or(|dst| dst.matches(remote))
    }

    /// Effective rank of this rule when stored at list position `idx`.
    pub fn rank(&self, idx: usize) -> u32 {
        self.priority
            .unwrap_or_else(|| u32::try_from(idx).unwrap_or(u32::MAX))
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} --src {}", self.action, self.src)?;
        if let Some(ref dst) = self.dst {
            write!(f, " --dst {dst}")?;
        }
        if let Some(priority) = self.priority {
            write!(f, " --priority {priority}")?;
        }
        Ok(())
    }
}

/// A rule as held by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstalledRule {
    pub id: RuleId,
    #[serde(flatten)]
    pub rule: Rule,
}
