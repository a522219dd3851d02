use mfe_config::{ConfigPaths, ConfigSource, LayerKind, LayeredConfig, MemoryStore, MockConfigSource};
use mfe_profiles::test_utils::capture_logs;
use mfe_profiles::{MergedProfile, ProfileCache, ProfileError, PropertyKind, TOKEN_TYPE_APIML};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;
use tracing::Level;

const API_TYPES: [&str; 2] = ["zosmf", "zftp"];

/// One zosmf and one zftp profile, and a base profile holding a gateway
/// token. The zftp profile carries the token it inherits from the base.
fn gateway_source() -> MockConfigSource {
    MockConfigSource::new()
        .with_profile("lpar1.zosmf", "zosmf", json!({ "host": "gw.example.com", "port": 7554 }))
        .with_profile(
            "lpar1.zftp",
            "zftp",
            json!({ "host": "lpar1.example.com", "port": 21, "tokenType": TOKEN_TYPE_APIML }),
        )
        .with_secure("lpar1.zftp", "tokenValue", json!("jwt"))
        .with_profile(
            "global_base",
            "base",
            json!({ "host": "gw.example.com", "port": 7554, "tokenType": TOKEN_TYPE_APIML }),
        )
        .with_secure("global_base", "tokenValue", json!("jwt"))
        .with_default("zosmf", "lpar1.zosmf")
        .with_default("zftp", "lpar1.zftp")
        .with_default("base", "global_base")
}

fn cache_over(source: MockConfigSource) -> (ProfileCache, Arc<MockConfigSource>) {
    let source = Arc::new(source);
    (ProfileCache::new(source.clone()), source)
}

async fn refreshed(source: MockConfigSource) -> (ProfileCache, Arc<MockConfigSource>) {
    let (cache, source) = cache_over(source);
    cache.refresh(&API_TYPES).await;
    (cache, source)
}

#[tokio::test]
async fn cache_starts_empty() {
    let (cache, _) = cache_over(gateway_source());
    assert!(cache.all_profiles().is_empty());
    assert!(cache.get_all_types().is_empty());
    assert!(cache.get_default_profile(None).is_none());
    assert!(cache.get_base_profile().is_none());
}

#[tokio::test]
async fn refresh_builds_catalog_for_registered_types() {
    let (cache, _) = refreshed(gateway_source()).await;

    assert_eq!(cache.get_all_types(), vec!["zosmf", "zftp", "ssh", "base"]);
    assert_eq!(cache.all_profiles().len(), 3);

    let zftp = cache.load_named_profile("lpar1.zftp", Some("zftp")).unwrap();
    assert_eq!(zftp.properties.token_type(), None);
    assert_eq!(zftp.properties.token_value(), None);
    assert_eq!(zftp.properties.host(), Some("lpar1.example.com"));

    let base = cache.get_base_profile().unwrap();
    assert_eq!(base.name, "global_base");
    assert_eq!(base.properties.token_value(), Some("jwt"));
}

#[tokio::test]
async fn default_pointer_sees_adjusted_profile() {
    let (cache, _) = refreshed(gateway_source()).await;

    let default = cache.get_default_profile(Some("zftp")).unwrap();
    let listed = cache.load_named_profile("lpar1.zftp", None).unwrap();
    assert!(Arc::ptr_eq(&default, &listed));
    assert_eq!(default.properties.token_value(), None);
}

#[tokio::test]
async fn load_named_profile_matches_name_and_type() {
    let (cache, _) = refreshed(gateway_source()).await;

    for profile in cache.all_profiles() {
        let loaded = cache
            .load_named_profile(&profile.name, Some(&profile.profile_type))
            .unwrap();
        assert_eq!(loaded.name, profile.name);
        assert_eq!(loaded.profile_type, profile.profile_type);
    }
}

#[tokio::test]
async fn load_named_profile_miss_names_the_profile() {
    let (cache, _) = refreshed(gateway_source()).await;

    let err = cache.load_named_profile("lpar9.zosmf", None).unwrap_err();
    assert!(matches!(err, ProfileError::NotFound { .. }));
    assert!(err.to_string().contains("lpar9.zosmf"));

    let err = cache.load_named_profile("lpar1.zosmf", Some("zftp")).unwrap_err();
    assert!(err.to_string().contains("lpar1.zosmf"));
}

#[tokio::test]
async fn get_profiles_defaults_to_zosmf() {
    let (cache, _) = refreshed(
        gateway_source().with_profile("lpar2.zosmf", "zosmf", json!({ "host": "lpar2.example.com" })),
    )
    .await;

    let names: Vec<_> = cache.get_profiles(None).iter().map(|p| p.name.clone()).collect();
    assert_eq!(names, vec!["lpar1.zosmf", "lpar2.zosmf"]);
    assert_eq!(cache.get_default_profile(None).unwrap().name, "lpar1.zosmf");
    assert!(cache.get_profiles(Some("ssh")).is_empty());
    assert!(cache.get_profiles(Some("tso")).is_empty());
}

#[tokio::test]
async fn failed_refresh_clears_catalog_and_logs_once() {
    let (cache, source) = refreshed(gateway_source()).await;
    assert_eq!(cache.all_profiles().len(), 3);

    source.fail_enumeration_for("zftp");
    let (subscriber, logs) = capture_logs();
    {
        let _guard = tracing::subscriber::set_default(subscriber);
        cache.refresh(&API_TYPES).await;
    }

    assert!(cache.all_profiles().is_empty());
    assert!(cache.get_all_types().is_empty());
    assert!(cache.get_default_profile(Some("zosmf")).is_none());
    assert_eq!(logs.count_at(Level::ERROR), 1);
    assert!(logs.at(Level::ERROR)[0].message.contains("zftp"));

    source.clear_failures();
    cache.refresh(&API_TYPES).await;
    assert_eq!(cache.all_profiles().len(), 3);
}

#[tokio::test]
async fn merge_failure_during_refresh_empties_catalog() {
    let (cache, source) = cache_over(gateway_source());
    source.fail_merge_for("lpar1.zosmf");

    let (subscriber, logs) = capture_logs();
    {
        let _guard = tracing::subscriber::set_default(subscriber);
        cache.refresh(&API_TYPES).await;
    }

    assert!(cache.all_profiles().is_empty());
    assert!(cache.get_all_types().is_empty());
    assert_eq!(logs.count_at(Level::ERROR), 1);
}

#[tokio::test]
async fn credential_probe_failure_is_treated_as_secured() {
    let (cache, _) = cache_over(gateway_source().with_probe_failure("vault unreachable"));

    let (subscriber, logs) = capture_logs();
    let secured = {
        let _guard = tracing::subscriber::set_default(subscriber);
        cache.is_credentials_secured().await
    };

    assert!(secured);
    assert_eq!(logs.count_at(Level::ERROR), 1);
    assert!(logs.contains("vault unreachable"));
}

#[tokio::test]
async fn credential_probe_result_is_passed_through() {
    let (plain, _) = cache_over(gateway_source().with_secured(false));
    assert!(!plain.is_credentials_secured().await);

    let (vault, _) = cache_over(gateway_source().with_secured(true));
    assert!(vault.is_credentials_secured().await);
}

#[tokio::test]
async fn update_profiles_arrays_is_idempotent() {
    let (cache, _) = refreshed(gateway_source()).await;

    let mut updated = MergedProfile::clone(&cache.load_named_profile("lpar1.zosmf", None).unwrap());
    updated.properties.insert("port", json!(1443));

    assert!(cache.update_profiles_arrays(updated.clone()));
    let once = cache.snapshot();
    assert!(cache.update_profiles_arrays(updated));
    let twice = cache.snapshot();

    assert_eq!(*once, *twice);
    assert_eq!(twice.len(), 3);
    assert_eq!(cache.get_default_profile(None).unwrap().properties.port(), Some(1443));
    assert_eq!(cache.get_profiles(None)[0].properties.port(), Some(1443));
}

#[tokio::test]
async fn update_profiles_arrays_leaves_earlier_snapshots_untouched() {
    let (cache, _) = refreshed(gateway_source()).await;
    let before = cache.snapshot();

    let mut updated = MergedProfile::clone(&cache.load_named_profile("lpar1.zftp", None).unwrap());
    updated.properties.insert("tokenValue", json!("fresh"));
    assert!(cache.update_profiles_arrays(updated));

    assert_eq!(
        before.find("lpar1.zftp", None).unwrap().properties.token_value(),
        None
    );
    assert_eq!(
        cache.get_default_profile(Some("zftp")).unwrap().properties.token_value(),
        Some("fresh")
    );
}

#[tokio::test]
async fn update_profiles_arrays_ignores_unknown_profiles() {
    let (cache, _) = refreshed(gateway_source()).await;
    let before = cache.snapshot();

    let stranger = MergedProfile::new("lpar9.zosmf", "zosmf", Default::default());
    assert!(!cache.update_profiles_arrays(stranger));
    assert_eq!(*before, *cache.snapshot());
}

#[tokio::test]
async fn custom_types_join_the_next_refresh() {
    let source = gateway_source().with_profile("lpar1.tso", "tso", json!({ "account": "ACCT#" }));
    let (cache, _) = refreshed(source).await;
    assert!(cache.get_profiles(Some("tso")).is_empty());

    cache.register_custom_profiles_type("tso");
    cache.register_custom_profiles_type("tso");
    assert_eq!(
        cache.registered_types(&API_TYPES),
        vec!["zosmf", "zftp", "ssh", "tso", "base"]
    );

    cache.refresh(&API_TYPES).await;
    assert_eq!(cache.get_profiles(Some("tso")).len(), 1);
    assert_eq!(cache.get_all_types(), vec!["zosmf", "zftp", "ssh", "tso", "base"]);
}

#[tokio::test]
async fn registered_types_never_repeat() {
    let (cache, _) = cache_over(MockConfigSource::new());
    assert_eq!(
        cache.registered_types(&["zosmf", "ssh", "base", "zosmf"]),
        vec!["zosmf", "ssh", "base"]
    );
    assert_eq!(cache.registered_types(&[]), vec!["ssh", "base"]);
}

#[tokio::test]
async fn fetch_by_type_is_fresh_and_leaves_catalog_alone() {
    let (cache, source) = refreshed(gateway_source()).await;
    source.add_profile(
        "lpar2.zftp",
        "zftp",
        json!({ "host": "gw.example.com", "port": 7554, "tokenType": TOKEN_TYPE_APIML, "tokenValue": "jwt" }),
    );

    let fetched = cache.fetch_all_profiles_by_type("zftp").await.unwrap();
    assert_eq!(fetched.len(), 2);
    assert_eq!(fetched[0].properties.token_value(), None);
    // same endpoint as the base profile
    assert_eq!(fetched[1].properties.token_value(), Some("jwt"));

    assert_eq!(cache.get_profiles(Some("zftp")).len(), 1);
}

#[tokio::test]
async fn fetch_all_covers_every_refreshed_type() {
    let (cache, _) = refreshed(gateway_source()).await;
    let fetched = cache.fetch_all_profiles().await.unwrap();
    let names: Vec<_> = fetched.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["lpar1.zosmf", "lpar1.zftp", "global_base"]);
}

#[tokio::test]
async fn fetch_skips_profiles_that_fail_to_merge() {
    let (cache, source) = refreshed(gateway_source()).await;
    source.add_profile("lpar2.zosmf", "zosmf", json!({ "host": "lpar2.example.com" }));
    source.fail_merge_for("lpar1.zosmf");

    let fetched = cache.fetch_all_profiles_by_type("zosmf").await.unwrap();
    assert_eq!(fetched.len(), 1);
    assert_eq!(fetched[0].name, "lpar2.zosmf");
}

#[tokio::test]
async fn fetch_base_profile_reads_the_source() {
    let (cache, source) = cache_over(gateway_source());
    let base = cache.fetch_base_profile().await.unwrap().unwrap();
    assert_eq!(base.name, "global_base");
    assert!(cache.get_base_profile().is_none());

    source.remove_profile("global_base");
    assert!(cache.fetch_base_profile().await.unwrap().is_none());
}

#[tokio::test]
async fn fetches_survive_a_base_profile_that_fails_to_merge() {
    let (cache, source) = cache_over(gateway_source());
    source.fail_merge_for("global_base");
    assert!(cache.fetch_base_profile().await.is_err());

    let (subscriber, logs) = capture_logs();
    let (fetched, loaded) = {
        let _guard = tracing::subscriber::set_default(subscriber);
        let fetched = cache.fetch_all_profiles_by_type("zftp").await.unwrap();
        let loaded = cache.direct_load("zosmf", "lpar1.zosmf").await;
        (fetched, loaded)
    };

    // no base to compare against, so the token stays
    assert_eq!(fetched.len(), 1);
    assert_eq!(fetched[0].properties.token_value(), Some("jwt"));
    assert_eq!(loaded.unwrap().properties.host(), Some("gw.example.com"));
    assert!(logs.contains("Could not load the base profile"));
    assert_eq!(logs.count_at(Level::ERROR), 0);
}

#[tokio::test]
async fn first_base_profile_stands_in_for_a_missing_default() {
    let source = MockConfigSource::new()
        .with_profile(
            "lpar1.zftp",
            "zftp",
            json!({ "host": "other.example.com", "port": 21, "tokenType": TOKEN_TYPE_APIML }),
        )
        .with_secure("lpar1.zftp", "tokenValue", json!("jwt"))
        .with_profile(
            "first_base",
            "base",
            json!({ "host": "gw.example.com", "port": 7554, "tokenType": TOKEN_TYPE_APIML }),
        )
        .with_profile(
            "second_base",
            "base",
            json!({ "host": "other.example.com", "port": 21, "tokenType": TOKEN_TYPE_APIML }),
        );
    let (cache, _) = refreshed(source).await;

    assert!(cache.get_default_profile(Some("base")).is_none());
    assert_eq!(cache.get_base_profile().unwrap().name, "first_base");

    // compared with first_base, whose address differs
    let zftp = cache.load_named_profile("lpar1.zftp", Some("zftp")).unwrap();
    assert_eq!(zftp.properties.token_value(), None);

    let fetched = cache.fetch_all_profiles_by_type("zftp").await.unwrap();
    assert_eq!(fetched[0].properties.token_value(), None);
    assert_eq!(cache.fetch_base_profile().await.unwrap().unwrap().name, "first_base");
}

#[tokio::test]
async fn direct_load_returns_none_on_miss() {
    let (cache, source) = cache_over(gateway_source());

    let hit = cache.direct_load("zftp", "lpar1.zftp").await.unwrap();
    assert_eq!(hit.properties.token_value(), None);
    assert!(cache.direct_load("zftp", "lpar1.zosmf").await.is_none());
    assert!(cache.direct_load("zosmf", "ghost").await.is_none());

    source.fail_enumeration_for("zosmf");
    assert!(cache.direct_load("zosmf", "lpar1.zosmf").await.is_none());
}

#[tokio::test]
async fn raw_config_lookups() {
    let (cache, source) = cache_over(gateway_source());

    let attrs = cache.get_profile_from_config("lpar1.zftp", None).await.unwrap();
    assert_eq!(attrs.profile_type, "zftp");
    assert!(attrs.is_default);
    assert!(cache.get_profile_from_config("lpar1.zftp", Some("zosmf")).await.is_none());

    let default = cache.get_default_config_profile("zosmf").await.unwrap();
    assert_eq!(default.name, "lpar1.zosmf");
    assert!(cache.get_default_config_profile("ssh").await.is_none());

    assert_eq!(cache.get_names_for_type("zosmf").await.unwrap(), vec!["lpar1.zosmf"]);

    source.fail_enumeration_for("zosmf");
    assert!(cache.get_names_for_type("zosmf").await.is_err());
}

#[tokio::test]
async fn loaded_prof_config_applies_token_policy() {
    let (cache, _) = cache_over(gateway_source());

    let zftp = cache.get_loaded_prof_config("lpar1.zftp", None).await.unwrap();
    assert_eq!(zftp.properties.token_type(), None);
    assert_eq!(zftp.properties.port(), Some(21));

    let base = cache.get_loaded_prof_config("global_base", Some("base")).await.unwrap();
    assert_eq!(base.properties.token_value(), Some("jwt"));

    assert!(cache.get_loaded_prof_config("ghost", None).await.is_none());
}

#[tokio::test]
async fn schema_lookup() {
    let (cache, _) = cache_over(MockConfigSource::new());

    let zosmf = cache.get_schema("zosmf");
    assert_eq!(zosmf.properties["port"].kind, PropertyKind::Number);
    assert!(zosmf.properties["tokenValue"].secure);

    let unknown = cache.get_schema("my-plugin");
    assert_eq!(unknown.profile_type, "my-plugin");
    assert!(unknown.properties.is_empty());
}

#[tokio::test]
async fn url_validation_through_the_cache() {
    let (cache, _) = cache_over(MockConfigSource::new());

    let parsed = cache.validate_and_parse_url("https://example.com:443");
    assert!(parsed.valid);
    assert_eq!(parsed.protocol.as_deref(), Some("https"));
    assert_eq!(parsed.host.as_deref(), Some("example.com"));
    assert_eq!(parsed.port, Some(443));

    let invalid = cache.validate_and_parse_url("not a url");
    assert!(!invalid.valid);
    assert_eq!(invalid.protocol, None);
    assert_eq!(invalid.host, None);
    assert_eq!(invalid.port, None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_refreshes_install_complete_catalogs() {
    let (cache, source) = cache_over(gateway_source());
    let cache = Arc::new(cache);

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.refresh(&API_TYPES).await })
        })
        .collect();
    for result in futures::future::join_all(tasks).await {
        result.unwrap();
    }

    let snapshot = cache.snapshot();
    assert_eq!(snapshot.len(), 3);
    assert_eq!(snapshot.all_types().len(), 4);
    // four types enumerated per refresh, one refresh at a time
    assert_eq!(source.enumeration_count(), 8 * 4);
}

// ---- layered configuration on disk ----

struct Workspace {
    project: TempDir,
    home: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            project: TempDir::new().unwrap(),
            home: TempDir::new().unwrap(),
        }
    }

    fn paths(&self) -> ConfigPaths {
        ConfigPaths::new(
            Some(self.project.path().to_path_buf()),
            self.home.path().to_path_buf(),
        )
    }

    fn write(&self, kind: LayerKind, value: serde_json::Value) {
        let path = self.paths().layer_path(kind).unwrap();
        std::fs::write(path, serde_json::to_string_pretty(&value).unwrap()).unwrap();
    }
}

#[tokio::test]
async fn layered_config_token_inheritance() {
    let workspace = Workspace::new();
    workspace.write(
        LayerKind::Global,
        json!({
            "profiles": {
                "global_base": {
                    "type": "base",
                    "properties": {
                        "host": "gw.example.com",
                        "port": 7554,
                        "tokenType": TOKEN_TYPE_APIML
                    },
                    "secure": ["tokenValue"]
                }
            },
            "defaults": { "base": "global_base" }
        }),
    );
    workspace.write(
        LayerKind::Project,
        json!({
            "profiles": {
                "lpar1": {
                    "properties": { "host": "lpar1.example.com" },
                    "profiles": {
                        "zosmf": { "type": "zosmf", "properties": { "port": 443 } },
                        "zftp": { "type": "zftp", "properties": { "port": 21 } }
                    }
                },
                "gateway": { "type": "zosmf", "properties": {} }
            },
            "defaults": { "zosmf": "gateway", "zftp": "lpar1.zftp" }
        }),
    );

    let config = LayeredConfig::load(workspace.paths(), Arc::new(MemoryStore::new()))
        .await
        .unwrap();
    config
        .store_secure_value("global_base", "tokenValue", &json!("jwt"))
        .unwrap();

    let cache = ProfileCache::new(Arc::new(config));
    cache.refresh(&API_TYPES).await;

    assert_eq!(cache.get_all_types(), vec!["zosmf", "zftp", "ssh", "base"]);
    assert_eq!(cache.all_profiles().len(), 4);

    // lpar1 profiles point at another endpoint than the base profile
    for name in ["lpar1.zosmf", "lpar1.zftp"] {
        let profile = cache.load_named_profile(name, None).unwrap();
        assert_eq!(profile.properties.host(), Some("lpar1.example.com"));
        assert_eq!(profile.properties.token_type(), None, "{name}");
        assert_eq!(profile.properties.token_value(), None, "{name}");
    }

    let gateway = cache.get_default_profile(None).unwrap();
    assert_eq!(gateway.name, "gateway");
    assert_eq!(gateway.properties.host(), Some("gw.example.com"));
    assert_eq!(gateway.properties.port(), Some(7554));
    assert_eq!(gateway.properties.token_value(), Some("jwt"));

    assert!(!cache.is_credentials_secured().await);
    assert!(cache.source().is_secured().await.is_ok());
}
