// clipscrub-core/tests/rule_store_tests.rs
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use serde_json::json;

use clipscrub_core::{
    ChangeReason, ClipscrubError, EmbeddedDefaults, FileDefaults, JsonFileStore, KeyValueStore,
    MemoryStore, MutationOutcome, MutationRejection, Rule, RuleSet, RuleStore, RULES_KEY,
};

fn store_over(kv: Arc<MemoryStore>) -> RuleStore {
    RuleStore::new(kv, Arc::new(EmbeddedDefaults))
}

#[test_log::test(tokio::test)]
async fn test_bootstrap_twice_writes_once() -> Result<()> {
    let kv = Arc::new(MemoryStore::new());
    let store = store_over(kv.clone());

    let first = store.load().await?;
    let second = store.load().await?;

    assert_eq!(kv.write_count(), 1);
    assert_eq!(first, second);
    assert_eq!(first, RuleSet::load_default_rules()?);
    Ok(())
}

#[tokio::test]
async fn test_concurrent_bootstrap_writes_once() -> Result<()> {
    let kv = Arc::new(MemoryStore::new().with_latency(Duration::from_millis(5)));
    let store = Arc::new(store_over(kv.clone()));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.initialize().await })
        })
        .collect();

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await??);
    }

    assert_eq!(kv.write_count(), 1);
    assert!(results.windows(2).all(|w| w[0] == w[1]));
    Ok(())
}

#[tokio::test]
async fn test_existing_rules_are_not_overwritten() -> Result<()> {
    let kv = Arc::new(MemoryStore::with_entry(
        RULES_KEY,
        json!({"sites": ["https://mine.com/*"], "rules": [{"pattern": "x", "replacement": "y"}]}),
    ));
    let store = store_over(kv.clone());

    let set = store.load().await?;
    assert_eq!(set.sites, vec!["https://mine.com/*".to_string()]);
    assert_eq!(set.rules, vec![Rule::new("x", "y")]);
    assert_eq!(kv.write_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_malformed_stored_document_is_config_missing() {
    let kv = Arc::new(MemoryStore::with_entry(RULES_KEY, json!({"rules": "not a list"})));
    let store = store_over(kv.clone());

    let err = store.load().await.unwrap_err();
    assert!(matches!(err, ClipscrubError::ConfigMissing(_)));
    assert_eq!(kv.write_count(), 0);
}

#[tokio::test]
async fn test_read_does_not_bootstrap() -> Result<()> {
    let kv = Arc::new(MemoryStore::new());
    let store = store_over(kv.clone());
    assert!(store.read().await?.is_none());
    assert_eq!(kv.write_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_delete_rule_out_of_range_is_noop() -> Result<()> {
    let kv = Arc::new(MemoryStore::new());
    let store = store_over(kv.clone());
    let before = store.initialize().await?;
    let len = before.rules.len() as i64;

    for index in [-1, len] {
        let outcome = store.delete_rule(index).await?;
        assert_eq!(
            outcome,
            MutationOutcome::Rejected(MutationRejection::IndexOutOfRange {
                index,
                len: before.rules.len()
            })
        );
    }

    assert_eq!(store.load().await?, before);
    assert_eq!(kv.write_count(), 1);
    Ok(())
}

#[tokio::test]
async fn test_add_site_twice_keeps_one() -> Result<()> {
    let store = store_over(Arc::new(MemoryStore::new()));

    assert!(store.add_site("x").await?.is_applied());
    assert_eq!(
        store.add_site("x").await?,
        MutationOutcome::Rejected(MutationRejection::DuplicateSite("x".to_string()))
    );

    let set = store.load().await?;
    assert_eq!(set.sites.iter().filter(|s| s.as_str() == "x").count(), 1);
    Ok(())
}

#[tokio::test]
async fn test_rule_mutations_round_trip() -> Result<()> {
    let store = store_over(Arc::new(MemoryStore::new()));
    let base = store.initialize().await?.rules.len() as i64;

    store.add_rule("foo", "bar").await?;
    store.add_rule("foo", "baz").await?;
    let set = store.load().await?;
    assert_eq!(set.rules[base as usize], Rule::new("foo", "bar"));
    assert_eq!(set.rules[base as usize + 1], Rule::new("foo", "baz"));

    assert!(store.update_rule(base, "qux", "quux").await?.is_applied());
    assert!(store.delete_rule(base + 1).await?.is_applied());
    let set = store.load().await?;
    assert_eq!(set.rules.len() as i64, base + 1);
    assert_eq!(set.rules[base as usize], Rule::new("qux", "quux"));
    Ok(())
}

#[tokio::test]
async fn test_delete_site_absent_is_noop() -> Result<()> {
    let kv = Arc::new(MemoryStore::new());
    let store = store_over(kv.clone());
    store.initialize().await?;

    let outcome = store.delete_site("https://never-added.example/*").await?;
    assert!(!outcome.is_applied());
    assert_eq!(kv.write_count(), 1);
    Ok(())
}

#[tokio::test]
async fn test_concurrent_mutations_do_not_lose_updates() -> Result<()> {
    let kv = Arc::new(MemoryStore::new().with_latency(Duration::from_millis(2)));
    let store = Arc::new(store_over(kv.clone()));
    let base = store.initialize().await?.rules.len();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.add_rule(&format!("p{}", i), "r").await })
        })
        .collect();
    for handle in handles {
        assert!(handle.await??.is_applied());
    }

    let set = store.load().await?;
    assert_eq!(set.rules.len(), base + 8);
    for i in 0..8 {
        assert!(set.rules.iter().any(|r| r.pattern == format!("p{}", i)));
    }
    Ok(())
}

#[tokio::test]
async fn test_separate_stores_over_shared_storage_do_not_lose_updates() -> Result<()> {
    let kv = Arc::new(MemoryStore::new().with_latency(Duration::from_millis(5)));
    let first = store_over(kv.clone());
    let second = store_over(kv.clone());

    let (a, b) = tokio::join!(first.add_rule("from-first", "x"), second.add_rule("from-second", "y"));
    assert!(a?.is_applied());
    assert!(b?.is_applied());

    let set = first.load().await?;
    let base = RuleSet::load_default_rules()?.rules.len();
    assert_eq!(set.rules.len(), base + 2);
    assert!(set.rules.contains(&Rule::new("from-first", "x")));
    assert!(set.rules.contains(&Rule::new("from-second", "y")));
    // One bootstrap plus one write per mutation.
    assert_eq!(kv.write_count(), 3);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_file_stores_over_one_directory_share_a_writer() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let writers = 4;
    let per_writer = 5;

    let handles: Vec<_> = (0..writers)
        .map(|w| {
            let path = dir.path().to_path_buf();
            tokio::spawn(async move {
                let store = RuleStore::new(Arc::new(JsonFileStore::new(path)), Arc::new(EmbeddedDefaults));
                for n in 0..per_writer {
                    let outcome = store.add_rule(&format!("w{}-{}", w, n), "r").await?;
                    assert!(outcome.is_applied());
                }
                Ok::<_, ClipscrubError>(())
            })
        })
        .collect();
    for handle in handles {
        handle.await??;
    }

    let store = RuleStore::new(Arc::new(JsonFileStore::new(dir.path())), Arc::new(EmbeddedDefaults));
    let set = store.load().await?;
    let base = RuleSet::load_default_rules()?.rules.len();
    assert_eq!(set.rules.len(), base + writers * per_writer);
    for w in 0..writers {
        for n in 0..per_writer {
            assert!(set.rules.iter().any(|r| r.pattern == format!("w{}-{}", w, n)));
        }
    }
    Ok(())
}

#[tokio::test]
async fn test_empty_pattern_rule_is_rejected() -> Result<()> {
    let kv = Arc::new(MemoryStore::new());
    let store = store_over(kv.clone());
    let before = store.initialize().await?;

    assert_eq!(
        store.add_rule("", "X").await?,
        MutationOutcome::Rejected(MutationRejection::EmptyPattern)
    );
    assert_eq!(
        store.update_rule(0, "", "X").await?,
        MutationOutcome::Rejected(MutationRejection::EmptyPattern)
    );
    assert_eq!(store.load().await?, before);
    assert_eq!(kv.write_count(), 1);
    Ok(())
}

#[tokio::test]
async fn test_notifications_follow_writes() -> Result<()> {
    let store = store_over(Arc::new(MemoryStore::new()));
    let mut rx = store.subscribe();

    store.initialize().await?;
    store.add_site("https://new.example/*").await?;
    store.add_site("https://new.example/*").await?;
    store.delete_site("https://new.example/*").await?;

    assert_eq!(rx.recv().await?.reason, ChangeReason::Bootstrapped);
    let added = rx.recv().await?;
    assert_eq!(added.reason, ChangeReason::SiteAdded);
    assert_eq!(rx.recv().await?.reason, ChangeReason::SiteDeleted);
    assert!(rx.try_recv().is_err());

    let current = store.load().await?;
    assert_ne!(added.revision, current.fingerprint());
    Ok(())
}

#[tokio::test]
async fn test_reset_restores_defaults() -> Result<()> {
    let store = store_over(Arc::new(MemoryStore::new()));
    store.initialize().await?;
    store.add_rule("custom", "x").await?;

    let reset = store.reset_to_defaults().await?;
    assert_eq!(reset, RuleSet::load_default_rules()?);
    assert_eq!(store.load().await?, reset);
    Ok(())
}

#[tokio::test]
async fn test_file_backed_store_survives_reopen() -> Result<()> {
    let dir = tempfile::tempdir()?;
    {
        let store = RuleStore::new(Arc::new(JsonFileStore::new(dir.path())), Arc::new(EmbeddedDefaults));
        store.add_site("https://persisted.example/*").await?;
    }

    let kv = JsonFileStore::new(dir.path());
    assert!(kv.get(RULES_KEY).await?.is_some());
    let store = RuleStore::new(Arc::new(kv), Arc::new(EmbeddedDefaults));
    let set = store.load().await?;
    assert!(set.sites.contains(&"https://persisted.example/*".to_string()));
    Ok(())
}

#[tokio::test]
async fn test_file_defaults_json_and_yaml() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let json_path = dir.path().join("defaults.json");
    std::fs::write(&json_path, r#"{"sites": ["https://j.com/*"], "rules": []}"#)?;
    let yaml_path = dir.path().join("defaults.yaml");
    std::fs::write(&yaml_path, "sites:\n  - \"https://y.com/*\"\nrules: []\n")?;

    let from_json = RuleStore::new(Arc::new(MemoryStore::new()), Arc::new(FileDefaults::new(&json_path)));
    assert_eq!(from_json.load().await?.sites, vec!["https://j.com/*".to_string()]);

    let from_yaml = RuleStore::new(Arc::new(MemoryStore::new()), Arc::new(FileDefaults::new(&yaml_path)));
    assert_eq!(from_yaml.load().await?.sites, vec!["https://y.com/*".to_string()]);
    Ok(())
}

#[tokio::test]
async fn test_missing_defaults_file_is_config_missing() {
    let store = RuleStore::with_policy(
        Arc::new(MemoryStore::new()),
        Arc::new(FileDefaults::new("/nonexistent/clipscrub/defaults.json")),
        clipscrub_core::FetchPolicy {
            max_attempts: 2,
            backoff: Duration::from_millis(1),
        },
    );
    let err = store.load().await.unwrap_err();
    assert!(matches!(err, ClipscrubError::ConfigMissing(_)));
}
