// clipscrub-core/src/store.rs
//! The authoritative rule store.
//!
//! `RuleStore` owns the persisted [`RuleSet`] behind an injectable
//! [`KeyValueStore`] and a [`DefaultRulesSource`] used to seed it on first
//! run. Its lifecycle is explicit: [`RuleStore::initialize`] (bootstrap or
//! load), [`RuleStore::read`], and [`RuleStore::mutate`].
//!
//! Bootstrap, reset and every mutation hold the backing store's lock on the
//! rules key for the whole read-modify-write. The lock lives in the storage,
//! not in the `RuleStore`, so separate instances and separate processes over
//! the same storage still have a single writer: concurrent bootstraps produce
//! one write, and mutations never lose updates.
//!
//! License: MIT OR APACHE 2.0

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use serde::Serialize;
use tokio::sync::broadcast;

use crate::config::{MutationRejection, Rule, RuleSet};
use crate::errors::{ClipscrubError, Result};
use crate::storage::{KeyValueStore, RULES_KEY};

const CHANGE_CHANNEL_CAPACITY: usize = 32;

/// Supplies the bundled default rule document.
#[async_trait]
pub trait DefaultRulesSource: Send + Sync {
    async fn fetch(&self) -> Result<RuleSet>;
}

/// The document compiled into the library (`config/default_rules.json`).
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedDefaults;

#[async_trait]
impl DefaultRulesSource for EmbeddedDefaults {
    async fn fetch(&self) -> Result<RuleSet> {
        RuleSet::load_default_rules()
    }
}

/// A default document on disk. `.yaml`/`.yml` files are parsed as YAML,
/// anything else as JSON.
#[derive(Debug, Clone)]
pub struct FileDefaults {
    path: PathBuf,
}

impl FileDefaults {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DefaultRulesSource for FileDefaults {
    async fn fetch(&self) -> Result<RuleSet> {
        info!("Loading default rules from: {}", self.path.display());
        let text = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            ClipscrubError::ConfigMissing(format!("cannot read {}: {}", self.path.display(), e))
        })?;
        let is_yaml = self
            .path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));
        if is_yaml {
            RuleSet::from_yaml_str(&text)
        } else {
            RuleSet::from_json_str(&text)
        }
    }
}

/// Bounded retry policy for fetching the bundled defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchPolicy {
    pub max_attempts: u32,
    /// Delay before retry `n` is `backoff * n`.
    pub backoff: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(50),
        }
    }
}

/// Result of a mutation request. Rejections leave the stored set untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    Applied,
    Rejected(MutationRejection),
}

impl MutationOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeReason {
    Bootstrapped,
    RuleAdded,
    RuleUpdated,
    RuleDeleted,
    SiteAdded,
    SiteDeleted,
    Reset,
}

/// Published after every write so views can refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleSetChanged {
    pub reason: ChangeReason,
    /// [`RuleSet::fingerprint`] of the new set.
    pub revision: String,
    pub changed_at: DateTime<Utc>,
}

pub struct RuleStore {
    store: Arc<dyn KeyValueStore>,
    defaults: Arc<dyn DefaultRulesSource>,
    policy: FetchPolicy,
    changes: broadcast::Sender<RuleSetChanged>,
}

impl RuleStore {
    pub fn new(store: Arc<dyn KeyValueStore>, defaults: Arc<dyn DefaultRulesSource>) -> Self {
        Self::with_policy(store, defaults, FetchPolicy::default())
    }

    pub fn with_policy(
        store: Arc<dyn KeyValueStore>,
        defaults: Arc<dyn DefaultRulesSource>,
        policy: FetchPolicy,
    ) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            store,
            defaults,
            policy,
            changes,
        }
    }

    /// Receives a [`RuleSetChanged`] after every bootstrap, reset and applied mutation.
    pub fn subscribe(&self) -> broadcast::Receiver<RuleSetChanged> {
        self.changes.subscribe()
    }

    /// Returns the persisted set, seeding it from the defaults first if the
    /// store is empty.
    ///
    /// Fails with [`ClipscrubError::ConfigMissing`] when nothing is stored and
    /// the defaults cannot be fetched, or when the stored document is malformed.
    pub async fn initialize(&self) -> Result<RuleSet> {
        let _lock = self.store.lock(RULES_KEY).await?;
        self.load_or_bootstrap_locked().await
    }

    /// Alias of [`RuleStore::initialize`], used on every paste.
    pub async fn load(&self) -> Result<RuleSet> {
        self.initialize().await
    }

    /// Returns the persisted set without bootstrapping. `None` before first run.
    pub async fn read(&self) -> Result<Option<RuleSet>> {
        match self.store.get(RULES_KEY).await? {
            Some(value) => Ok(Some(RuleSet::from_json_value(value)?)),
            None => Ok(None),
        }
    }

    /// Applies `f` to the current set and persists the result.
    ///
    /// Runs under the rules key lock and bootstraps first if needed. When
    /// `f` rejects the change nothing is written and no notification is sent.
    pub async fn mutate<F>(&self, reason: ChangeReason, f: F) -> Result<MutationOutcome>
    where
        F: FnOnce(&mut RuleSet) -> std::result::Result<(), MutationRejection> + Send,
    {
        let _lock = self.store.lock(RULES_KEY).await?;
        let mut rule_set = self.load_or_bootstrap_locked().await?;

        if let Err(rejection) = f(&mut rule_set) {
            debug!("Mutation {:?} rejected: {}", reason, rejection);
            return Ok(MutationOutcome::Rejected(rejection));
        }

        self.persist(&rule_set, reason).await?;
        Ok(MutationOutcome::Applied)
    }

    /// Appends a rule. Empty patterns are rejected.
    pub async fn add_rule(&self, pattern: &str, replacement: &str) -> Result<MutationOutcome> {
        let rule = Rule::new(pattern, replacement);
        self.mutate(ChangeReason::RuleAdded, move |set| set.add_rule(rule)).await
    }

    /// Replaces the rule at `index`. Out-of-range indices and empty patterns are rejected.
    pub async fn update_rule(&self, index: i64, pattern: &str, replacement: &str) -> Result<MutationOutcome> {
        let rule = Rule::new(pattern, replacement);
        self.mutate(ChangeReason::RuleUpdated, move |set| {
            set.update_rule(index, rule).map(|_| ())
        })
        .await
    }

    /// Removes the rule at `index`. Negative or out-of-range indices are rejected.
    pub async fn delete_rule(&self, index: i64) -> Result<MutationOutcome> {
        self.mutate(ChangeReason::RuleDeleted, move |set| {
            set.delete_rule(index).map(|_| ())
        })
        .await
    }

    pub async fn add_site(&self, site: &str) -> Result<MutationOutcome> {
        self.mutate(ChangeReason::SiteAdded, |set| set.add_site(site)).await
    }

    pub async fn delete_site(&self, site: &str) -> Result<MutationOutcome> {
        self.mutate(ChangeReason::SiteDeleted, |set| set.delete_site(site)).await
    }

    /// Overwrites the stored set with a fresh copy of the defaults.
    pub async fn reset_to_defaults(&self) -> Result<RuleSet> {
        let _lock = self.store.lock(RULES_KEY).await?;
        let defaults = self.fetch_defaults().await?;
        self.persist(&defaults, ChangeReason::Reset).await?;
        Ok(defaults)
    }

    async fn load_or_bootstrap_locked(&self) -> Result<RuleSet> {
        if let Some(existing) = self.read().await? {
            return Ok(existing);
        }

        info!("No stored rule set found; seeding from bundled defaults.");
        let defaults = self.fetch_defaults().await?;
        self.persist(&defaults, ChangeReason::Bootstrapped).await?;
        Ok(defaults)
    }

    async fn fetch_defaults(&self) -> Result<RuleSet> {
        let attempts = self.policy.max_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            match self.defaults.fetch().await {
                Ok(rule_set) => return Ok(rule_set),
                Err(e) => {
                    warn!("Fetching default rules failed (attempt {}/{}): {}", attempt, attempts, e);
                    last_error = Some(e);
                    if attempt < attempts {
                        tokio::time::sleep(self.policy.backoff * attempt).await;
                    }
                }
            }
        }

        let reason = last_error.map(|e| e.to_string()).unwrap_or_default();
        error!("Default rules unavailable after {} attempts.", attempts);
        Err(ClipscrubError::ConfigMissing(format!(
            "default rules unavailable after {} attempt(s): {}",
            attempts, reason
        )))
    }

    async fn persist(&self, rule_set: &RuleSet, reason: ChangeReason) -> Result<()> {
        self.store.set(RULES_KEY, rule_set.to_json_value()?).await?;
        debug!(
            "Persisted rule set ({} rules, {} sites) after {:?}.",
            rule_set.rules.len(),
            rule_set.sites.len(),
            reason
        );
        // No subscribers is fine.
        let _ = self.changes.send(RuleSetChanged {
            reason,
            revision: rule_set.fingerprint(),
            changed_at: Utc::now(),
        });
        Ok(())
    }
}
