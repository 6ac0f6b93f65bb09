// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#[cfg(test)]
mod store_tests {
    use std::fs;
    use std::path::PathBuf;
    use std::sync::Arc;

    use tempfile::TempDir;

    use crate::config::{ConfigError, FileFormat, RuleSet};
    use crate::store::ConfigStore;

    const ONE_RULE: &str = r#"{ "routes": [
        { "name": "glm", "pathPrefix": "/glm", "target": "ZhiPu,glm-4.6" }
    ] }"#;

    const TWO_RULES: &str = r#"{ "routes": [
        { "name": "glm", "pathPrefix": "/glm", "target": "ZhiPu,glm-4.6" },
        { "name": "anthropic", "pathPrefix": "/anthropic",
          "target": "new-api-free,claude-sonnet4-5" }
    ] }"#;

    fn write_config(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).expect("write config file");
        path
    }

    #[test]
    fn test_open_missing_source_degrades_to_empty() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::open(dir.path().join("does-not-exist.json"));

        let rules = store.current();
        assert!(rules.routes.is_empty());
    }

    #[test]
    fn test_open_unparseable_source_degrades_to_empty() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "routes.json", "{ nope");
        let store = ConfigStore::open(path);

        assert!(store.current().routes.is_empty());
    }

    #[test]
    fn test_open_loads_rules() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "routes.json", ONE_RULE);
        let store = ConfigStore::open(path);

        let rules = store.current();
        assert_eq!(rules.routes.len(), 1);
        assert_eq!(rules.routes[0].target, "ZhiPu,glm-4.6");
    }

    #[test]
    fn test_unknown_extension_defaults_to_json() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "routes.conf", ONE_RULE);
        let store = ConfigStore::open(path);

        assert_eq!(store.current().routes.len(), 1);
    }

    #[test]
    fn test_open_toml_source() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            "routes.toml",
            r#"
            [[routes]]
            name = "glm"
            pathPrefix = "/glm"
            target = "ZhiPu,glm-4.6"
            "#,
        );
        let store = ConfigStore::open(path);

        assert_eq!(store.current().routes.len(), 1);
    }

    #[test]
    fn test_reload_is_idempotent_while_source_unchanged() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "routes.json", ONE_RULE);
        let store = ConfigStore::open(path);

        let first = store.reload().expect("reload");
        let second = store.reload().expect("reload");
        // Unchanged source: the cached snapshot is returned without reparsing
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_reload_picks_up_source_changes() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "routes.json", ONE_RULE);
        let store = ConfigStore::open(&path);
        assert_eq!(store.current().routes.len(), 1);

        fs::write(&path, TWO_RULES).unwrap();
        let rules = store.reload().expect("reload");
        assert_eq!(rules.routes.len(), 2);
        assert_eq!(store.current().routes.len(), 2);
    }

    #[test]
    fn test_current_polls_for_changes() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "routes.json", ONE_RULE);
        let store = ConfigStore::open(&path);
        assert_eq!(store.current().routes.len(), 1);

        // No explicit reload: the per-request staleness check finds the
        // rewritten document.
        fs::write(&path, TWO_RULES).unwrap();
        assert_eq!(store.current().routes.len(), 2);
    }

    #[test]
    fn test_failed_reload_keeps_previous_rules() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "routes.json", ONE_RULE);
        let store = ConfigStore::open(&path);

        fs::write(&path, "{ definitely not json").unwrap();
        let err = store.reload().unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)), "got {err:?}");

        // Last-good rule set stays active, even through the polling path
        let rules = store.current();
        assert_eq!(rules.routes.len(), 1);
        assert_eq!(rules.routes[0].name, "glm");
    }

    #[test]
    fn test_reload_reports_missing_source() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "routes.json", ONE_RULE);
        let store = ConfigStore::open(&path);

        fs::remove_file(&path).unwrap();
        let err = store.reload().unwrap_err();
        assert!(matches!(err, ConfigError::Unavailable(_)), "got {err:?}");
        assert_eq!(store.current().routes.len(), 1);
    }

    #[test]
    fn test_invalid_rule_on_reload_keeps_previous_rules() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "routes.json", ONE_RULE);
        let store = ConfigStore::open(&path);

        // Structurally valid JSON, but the rule violates the invariants
        fs::write(
            &path,
            r#"{ "routes": [ { "name": "bare", "target": "A" } ] }"#,
        )
        .unwrap();
        assert!(store.reload().is_err());
        assert_eq!(store.current().routes[0].name, "glm");
    }

    #[test]
    fn test_in_flight_snapshot_survives_reload() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "routes.json", ONE_RULE);
        let store = ConfigStore::open(&path);

        // A reader holding a snapshot across a reload keeps a fully
        // consistent view of the old rule set.
        let snapshot = store.current();
        fs::write(&path, TWO_RULES).unwrap();
        store.reload().expect("reload");

        assert_eq!(snapshot.routes.len(), 1);
        assert_eq!(store.current().routes.len(), 2);
    }

    #[test]
    fn test_with_rules_is_reload_proof() {
        let set: RuleSet =
            serde_json::from_str(ONE_RULE).expect("literal rule set");
        let store = ConfigStore::with_rules(set);

        let before = store.current();
        let after = store.reload().expect("no-op reload");
        assert!(Arc::ptr_eq(&before, &after));
    }

    #[test]
    fn test_watch_requires_a_source() {
        let store = Arc::new(ConfigStore::with_rules(RuleSet::empty()));
        assert!(store.watch().is_err());
    }

    #[test]
    fn test_concurrent_readers_during_reloads() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "routes.json", ONE_RULE);
        let store = Arc::new(ConfigStore::open(&path));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for _ in 0..200 {
                        let rules = store.current();
                        // Every snapshot is fully one rule set or the other
                        assert!(rules.routes.len() == 1 || rules.routes.len() == 2);
                    }
                })
            })
            .collect();

        for i in 0..20 {
            let doc = if i % 2 == 0 { TWO_RULES } else { ONE_RULE };
            fs::write(&path, doc).unwrap();
            let _ = store.reload();
        }

        for reader in readers {
            reader.join().unwrap();
        }
    }

    #[test]
    fn test_format_detection_matches_extension() {
        // from_extension drives the store; spot-check the mapping here
        assert_eq!(
            FileFormat::from_extension(std::path::Path::new("a.yaml")),
            Some(FileFormat::Yaml)
        );
    }
}
