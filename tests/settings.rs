//! Settings loading from files and the environment.

use hotswap_tls::prelude::*;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

// Each test owns a distinct prefix, so tests never observe each other's variables.
fn set_env(key: &str, value: &str) {
    unsafe {
        std::env::set_var(key, value);
    }
}

#[test]
fn test_env_overrides_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("tls.yaml");
    fs::write(
        &path,
        r#"
certificate:
  files: [tls/cert.pem]
  key_files: [tls/key.pem]
  reload_period: 300
"#,
    )
    .unwrap();

    set_env("HOTSWAP_TLS_OVERRIDE_CERTIFICATE__RELOAD_PERIOD", "90");

    let settings = SettingsLoader::new()
        .with_file(&path)
        .with_env_overrides("HOTSWAP_TLS_OVERRIDE", "__")
        .load()
        .unwrap();

    assert_eq!(settings.reload_period(), Some(Duration::from_secs(90)));
    assert_eq!(settings.files, vec![PathBuf::from("tls/cert.pem")]);
}

#[test]
fn test_env_only_lists() {
    set_env("HOTSWAP_TLS_LISTS_CERTIFICATE__FILES", "a.pem,b.pem");
    set_env("HOTSWAP_TLS_LISTS_CERTIFICATE__KEY_FILES", "a.key,b.key");
    set_env("HOTSWAP_TLS_LISTS_CERTIFICATE__RELOAD_PERIOD", "60");

    let settings = SettingsLoader::new()
        .with_env_overrides("HOTSWAP_TLS_LISTS", "__")
        .load()
        .unwrap();

    assert_eq!(
        settings.files,
        vec![PathBuf::from("a.pem"), PathBuf::from("b.pem")]
    );
    assert_eq!(
        settings.key_files,
        vec![PathBuf::from("a.key"), PathBuf::from("b.key")]
    );
    assert!(settings.source().validate().is_ok());
}

#[tokio::test]
async fn test_settings_drive_a_reload() {
    let temp_dir = TempDir::new().unwrap();
    let cert = temp_dir.path().join("cert.pem");
    let key = temp_dir.path().join("key.pem");
    fs::write(&cert, "cert-v1").unwrap();
    fs::write(&key, "key-v1").unwrap();

    let settings_path = temp_dir.path().join("tls.toml");
    fs::write(
        &settings_path,
        format!(
            "[certificate]\nfiles = [{:?}]\nkey_files = [{:?}]\nreload_period = 30\n",
            cert.display().to_string(),
            key.display().to_string()
        ),
    )
    .unwrap();

    let settings = SettingsLoader::new()
        .with_file(&settings_path)
        .load()
        .unwrap();

    let tls = Arc::new(SharedTlsConfig::new(TlsConfig::from_pem(
        fs::read(&cert).unwrap(),
        fs::read(&key).unwrap(),
    )));
    let scheduler = Scheduler::new();
    let handle = scheduler.start_with_settings(&tls, &settings).unwrap();
    let id = handle.id().unwrap();

    fs::write(&cert, "cert-v2").unwrap();
    assert_eq!(scheduler.force_reload().await, vec![(id, true)]);
    assert!(scheduler.cancel(handle));
}
