/// Integration tests for the configuration system
///
/// These tests verify that configuration loads correctly from files and
/// environment variables, and that the loaded policy drives the sack.

use sieve_pm::config::{Config, ConfigLoader, ConfigSource};
use sieve_pm::{JsonSolvCache, PackageSack, Pool, Repo, Solvable};
use std::env;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_config_defaults() {
    let config = Config::default();

    assert!(config.disable_excludes.is_empty());
    assert!(config.includepkgs.is_empty());
    assert!(config.excludepkgs.is_empty());
    assert!(config.cachedir.is_none());
    assert!(config.repos.is_empty());
}

#[test]
fn test_config_loader_env_disabled() {
    let loader = ConfigLoader::new(false);

    // Should return None when environment is disabled
    assert_eq!(loader.get_env("PATH"), None);
    assert_eq!(loader.get_env_config("excludepkgs"), None);
}

#[test]
fn test_config_loader_cache_dir() {
    let loader = ConfigLoader::new(false);

    let cache = loader.get_cache_dir();
    assert!(cache.is_absolute() || cache.ends_with(".sieve-cache"));
}

#[test]
fn test_load_missing_config_file() {
    let temp_dir = TempDir::new().unwrap();

    let loader = ConfigLoader::new(false);
    let raw = loader.load_config_file(temp_dir.path().join("missing.json")).unwrap();

    assert!(raw.main.is_none());
    assert!(raw.repos.is_none());
}

#[test]
fn test_load_empty_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("sieve.json");
    fs::write(&config_file, "{}").unwrap();

    let loader = ConfigLoader::new(false);
    let raw = loader.load_config_file(&config_file).unwrap();

    assert!(raw.main.is_none());
    assert!(raw.repos.is_none());
}

#[test]
fn test_load_invalid_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("sieve.json");
    fs::write(&config_file, "{ not json").unwrap();

    let result = Config::build(Some(&config_file), false);
    assert!(result.is_err());
}

#[test]
fn test_build_config_from_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("sieve.json");

    let config_json = r#"{
        "main": {
            "excludepkgs": "kernel*, firefox",
            "includepkgs": [],
            "disableexcludes": ["updates-testing"],
            "cachedir": "/var/cache/sieve"
        },
        "repos": {
            "fedora": { "excludepkgs": ["zsh"] },
            "updates": { "enabled": false, "includepkgs": "bash" }
        }
    }"#;
    fs::write(&config_file, config_json).unwrap();

    let config = Config::build(Some(&config_file), false).unwrap();

    assert_eq!(config.excludepkgs, vec!["kernel*", "firefox"]);
    assert!(config.includepkgs.is_empty());
    assert_eq!(config.disable_excludes, vec!["updates-testing"]);
    assert_eq!(config.cachedir, Some(PathBuf::from("/var/cache/sieve")));

    // repository sections keep file order
    let ids: Vec<&str> = config.repos.keys().map(String::as_str).collect();
    assert_eq!(ids, vec!["fedora", "updates"]);
    assert!(!config.repo("updates").unwrap().enabled);
    assert_eq!(config.repo("updates").unwrap().includepkgs, vec!["bash"]);

    assert_eq!(
        config.get_source("excludepkgs"),
        Some(&ConfigSource::File(config_file.clone()))
    );
    assert!(config.get_source("disable_excludes").is_some());
    assert!(config.get_source("repos.fedora").is_some());
}

#[test]
fn test_build_config_no_file_uses_default_cachedir() {
    let config = Config::build(None::<&str>, false).unwrap();

    assert!(config.cachedir.is_some());
    assert_eq!(config.get_source("cachedir"), Some(&ConfigSource::Default));
}

#[test]
fn test_config_env_overrides() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("sieve.json");
    fs::write(&config_file, r#"{ "main": { "excludepkgs": ["kernel"] } }"#).unwrap();

    env::set_var("SIEVE_EXCLUDEPKGS", "firefox thunderbird");
    env::set_var("SIEVE_CACHEDIR", "/tmp/sieve-env-cache");

    let config = Config::build(Some(&config_file), true).unwrap();

    assert_eq!(config.excludepkgs, vec!["firefox", "thunderbird"]);
    assert_eq!(config.cachedir, Some(PathBuf::from("/tmp/sieve-env-cache")));
    assert_eq!(
        config.get_source("excludepkgs"),
        Some(&ConfigSource::Environment("SIEVE_EXCLUDEPKGS".to_string()))
    );

    // Clean up
    env::remove_var("SIEVE_EXCLUDEPKGS");
    env::remove_var("SIEVE_CACHEDIR");
}

#[test]
fn test_config_file_drives_sack() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("sieve.json");
    let config_json = r#"{
        "main": { "excludepkgs": "kernel*" },
        "repos": { "updates": { "includepkgs": ["bash"] } }
    }"#;
    fs::write(&config_file, config_json).unwrap();
    let config = Config::build(Some(&config_file), false).unwrap();

    let mut pool = Pool::new();
    pool.add_repo(Repo::new("fedora"));
    pool.add_repo(Repo::new("updates"));
    pool.add_solvable("fedora", Solvable::new("bash", "5.2", "2", "x86_64")).unwrap();
    pool.add_solvable("fedora", Solvable::new("kernel", "6.5", "2", "x86_64")).unwrap();
    pool.add_solvable("updates", Solvable::new("bash", "5.2", "3", "x86_64")).unwrap();
    pool.add_solvable("updates", Solvable::new("zsh", "5.9", "2", "x86_64")).unwrap();

    let mut sack = PackageSack::new(pool);
    sack.setup_excludes_includes(&config, false);

    let visible: Vec<String> = sack
        .query()
        .solvables()
        .map(|(_, s)| s.nevra())
        .collect();
    assert_eq!(visible, vec!["bash-5.2-2.x86_64", "bash-5.2-3.x86_64"]);
}

#[test]
fn test_config_section_disables_repository() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("sieve.json");
    let config_json = r#"{
        "repos": { "updates": { "enabled": false, "excludepkgs": ["kernel"] } }
    }"#;
    fs::write(&config_file, config_json).unwrap();
    let config = Config::build(Some(&config_file), false).unwrap();

    let mut pool = Pool::new();
    pool.add_repo(Repo::new("fedora"));
    pool.add_repo(Repo::new("updates"));
    pool.add_solvable("fedora", Solvable::new("bash", "5.2", "2", "x86_64")).unwrap();
    pool.add_solvable("updates", Solvable::new("kernel", "6.6", "1", "x86_64")).unwrap();
    pool.add_solvable("updates", Solvable::new("zsh", "5.9", "2", "x86_64")).unwrap();

    let mut sack = PackageSack::new(pool);
    sack.setup_excludes_includes(&config, false);

    // the disabled section's exclude is never resolved
    assert!(sack.get_excludes().is_empty());
    assert_eq!(sack.get_repo_excludes().iter().collect::<Vec<_>>(), vec![2, 3]);
    assert_eq!(sack.query().iter().collect::<Vec<_>>(), vec![1]);
}

#[test]
fn test_cachedir_drives_solv_cache() {
    let temp_dir = TempDir::new().unwrap();
    let cache_dir = temp_dir.path().join("cache");
    let config_file = temp_dir.path().join("sieve.json");
    let config_json = format!(r#"{{ "main": {{ "cachedir": {:?} }} }}"#, cache_dir.to_str().unwrap());
    fs::write(&config_file, config_json).unwrap();
    let config = Config::build(Some(&config_file), false).unwrap();

    let cache = JsonSolvCache::from_config(&config).unwrap();
    let mut pool = Pool::new();
    pool.add_repo(Repo::new("fedora").with_cache(Box::new(cache.clone())));
    pool.add_solvable(
        "fedora",
        Solvable::new("zsh", "5.9", "3", "x86_64").with_files(["/usr/bin/zsh"]),
    )
    .unwrap();
    pool.add_solvable("fedora", Solvable::new("dotfiles", "1.0", "1", "noarch").with_requires(["/usr/bin/zsh"]))
        .unwrap();

    let mut sack = PackageSack::new(pool);
    sack.make_provides_ready().unwrap();

    assert!(cache_dir.join("fedora-filenames.json").exists());
    let stored = cache.read("fedora").unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].package, "zsh-5.9-3.x86_64");
}
