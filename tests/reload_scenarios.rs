//! End-to-end reload scenarios against files on disk.

use async_trait::async_trait;
use hotswap_tls::core::{ClientAuth, StoreOptions};
use hotswap_tls::prelude::*;
use hotswap_tls::reload::{ManualTimer, TaskId};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;

const PERIOD: Option<Duration> = Some(Duration::from_secs(60));

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("hotswap_tls=trace")
        .with_test_writer()
        .try_init();
}

struct PemFiles {
    _dir: TempDir,
    cert: PathBuf,
    key: PathBuf,
}

impl PemFiles {
    fn new(cert: &str, key: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let files = Self {
            cert: dir.path().join("cert.pem"),
            key: dir.path().join("key.pem"),
            _dir: dir,
        };
        fs::write(&files.cert, cert).unwrap();
        fs::write(&files.key, key).unwrap();
        files
    }

    fn source(&self) -> ReloadSource {
        ReloadSource::pem(&self.cert, &self.key)
    }

    fn server(&self) -> Arc<SharedTlsConfig> {
        Arc::new(SharedTlsConfig::new(
            TlsConfig::from_pem(fs::read(&self.cert).unwrap(), fs::read(&self.key).unwrap())
                .with_client_auth(ClientAuth::Request),
        ))
    }
}

fn manual_scheduler() -> (Arc<ManualTimer>, Scheduler) {
    let timer = Arc::new(ManualTimer::new());
    let scheduler = Scheduler::with_timer(timer.clone());
    (timer, scheduler)
}

async fn wait_for<F: Fn() -> bool>(condition: F) -> bool {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .is_ok()
}

#[tokio::test]
async fn test_unchanged_files_are_noop() {
    init_tracing();
    let files = PemFiles::new("cert-v1", "key-v1");
    let server = files.server();
    let (_timer, scheduler) = manual_scheduler();
    let handle = scheduler.start(&server, files.source(), PERIOD).unwrap();
    let before = server.get().unwrap();

    let results = scheduler.force_reload().await;
    assert_eq!(results, vec![(handle.id().unwrap(), false)]);

    // Nothing swapped, the very same snapshot is still installed.
    assert!(Arc::ptr_eq(&before, &server.get().unwrap()));
}

#[tokio::test]
async fn test_rotated_certificate_scenario() {
    init_tracing();
    let files = PemFiles::new("cert-v1", "key-v1");
    let server = files.server();
    let (_timer, scheduler) = manual_scheduler();
    let handle = scheduler.start(&server, files.source(), PERIOD).unwrap();
    let id = handle.id().unwrap();

    assert_eq!(scheduler.force_reload().await, vec![(id, false)]);
    assert_eq!(scheduler.force_reload().await, vec![(id, false)]);

    fs::write(&files.cert, "cert-v2").unwrap();
    assert_eq!(scheduler.force_reload().await, vec![(id, true)]);

    let active = server.get().unwrap();
    let pem = active.pem().unwrap();
    assert_eq!(pem.certs, vec![b"cert-v2".to_vec()]);
    assert_eq!(pem.keys, vec![b"key-v1".to_vec()]);
    // Settings inherited from the previous configuration.
    assert_eq!(active.client_auth, ClientAuth::Request);

    // Reloading again is idempotent.
    assert_eq!(scheduler.force_reload().await, vec![(id, false)]);
}

#[tokio::test]
async fn test_removed_key_keeps_old_pair() {
    init_tracing();
    let files = PemFiles::new("cert-v1", "key-v1");
    let server = files.server();
    let before = server.get().unwrap();
    let (_timer, scheduler) = manual_scheduler();
    let handle = scheduler.start(&server, files.source(), PERIOD).unwrap();

    fs::write(&files.cert, "cert-v2").unwrap();
    fs::remove_file(&files.key).unwrap();

    assert_eq!(scheduler.force_reload().await, vec![(handle.id().unwrap(), false)]);
    assert_eq!(*server.get().unwrap(), *before);

    // The task stays scheduled and recovers once the key is back.
    fs::write(&files.key, "key-v2").unwrap();
    assert_eq!(scheduler.force_reload().await, vec![(handle.id().unwrap(), true)]);
    assert_eq!(server.get().unwrap().pem().unwrap().keys[0], b"key-v2");
}

#[tokio::test]
async fn test_timer_tick_applies_update() {
    init_tracing();
    let files = PemFiles::new("cert-v1", "key-v1");
    let server = files.server();
    let (timer, scheduler) = manual_scheduler();
    let id = scheduler
        .start(&server, files.source(), PERIOD)
        .unwrap()
        .id()
        .unwrap();

    fs::write(&files.cert, "cert-v2").unwrap();
    assert!(timer.fire(id));

    let observed = Arc::clone(&server);
    assert!(
        wait_for(move || observed.get().unwrap().pem().unwrap().certs[0] == b"cert-v2").await
    );
}

#[tokio::test]
async fn test_cancelled_task_never_runs_again() {
    init_tracing();
    let files = PemFiles::new("cert-v1", "key-v1");
    let server = files.server();
    let (timer, scheduler) = manual_scheduler();
    let handle = scheduler.start(&server, files.source(), PERIOD).unwrap();
    let id = handle.id().unwrap();

    assert!(scheduler.cancel(handle));
    fs::write(&files.cert, "cert-v2").unwrap();

    assert!(!timer.fire(id));
    assert_eq!(timer.fire_all(), 0);
    assert!(scheduler.force_reload().await.is_empty());

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(server.get().unwrap().pem().unwrap().certs[0], b"cert-v1");
}

#[tokio::test]
async fn test_concurrent_forced_reloads_apply_once() {
    init_tracing();
    let files = PemFiles::new("cert-v1", "key-v1");
    let server = files.server();
    let (_timer, scheduler) = manual_scheduler();
    let id = scheduler
        .start(&server, files.source(), PERIOD)
        .unwrap()
        .id()
        .unwrap();

    fs::write(&files.cert, "cert-v2").unwrap();

    let scheduler = Arc::new(scheduler);
    let mut runs = Vec::new();
    for _ in 0..8 {
        let scheduler = Arc::clone(&scheduler);
        runs.push(tokio::spawn(async move { scheduler.force_reload().await }));
    }

    let mut applied = 0;
    for run in runs {
        for (task, changed) in run.await.unwrap() {
            assert_eq!(task, id);
            if changed {
                applied += 1;
            }
        }
    }

    assert_eq!(applied, 1);
    assert_eq!(server.get().unwrap().pem().unwrap().certs[0], b"cert-v2");
}

#[tokio::test]
async fn test_force_reload_covers_every_server() {
    init_tracing();
    let first = PemFiles::new("a-cert", "a-key");
    let second = PemFiles::new("b-cert", "b-key");
    let first_server = first.server();
    let second_server = second.server();
    let (_timer, scheduler) = manual_scheduler();

    let a = scheduler.start(&first_server, first.source(), PERIOD).unwrap();
    let b = scheduler.start(&second_server, second.source(), PERIOD).unwrap();

    fs::write(&second.key, "b-key-v2").unwrap();

    let results = scheduler.force_reload().await;
    assert_eq!(
        results,
        vec![(a.id().unwrap(), false), (b.id().unwrap(), true)]
    );
    assert_eq!(second_server.get().unwrap().pem().unwrap().keys[0], b"b-key-v2");
}

#[tokio::test]
async fn test_key_store_and_trust_store_reload() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let key_store = dir.path().join("server.p12");
    let trust_store = dir.path().join("trust.p12");
    fs::write(&key_store, b"keystore-v1").unwrap();
    fs::write(&trust_store, b"truststore-v1").unwrap();

    let server = Arc::new(SharedTlsConfig::new(
        TlsConfig::from_key_store(
            StoreOptions::new("PKCS12", b"keystore-v1".to_vec()).with_password("changeit"),
        )
        .with_trust(StoreOptions::new("PKCS12", b"truststore-v1".to_vec()))
        .with_client_auth(ClientAuth::Required),
    ));
    let (_timer, scheduler) = manual_scheduler();
    let source = ReloadSource::new()
        .with_key_store(&key_store)
        .with_trust_store(&trust_store);
    let id = scheduler.start(&server, source, PERIOD).unwrap().id().unwrap();

    assert_eq!(scheduler.force_reload().await, vec![(id, false)]);

    fs::write(&trust_store, b"truststore-v2").unwrap();
    assert_eq!(scheduler.force_reload().await, vec![(id, true)]);

    let active = server.get().unwrap();
    let store = active.key_store().unwrap();
    assert_eq!(store.value, b"keystore-v1");
    assert_eq!(store.password.as_deref(), Some("changeit"));
    assert_eq!(active.trust.as_ref().unwrap().value, b"truststore-v2");
}

#[tokio::test]
async fn test_dropped_server_is_not_kept_alive() {
    init_tracing();
    let files = PemFiles::new("cert-v1", "key-v1");
    let server = files.server();
    let (timer, scheduler) = manual_scheduler();
    let id = scheduler
        .start(&server, files.source(), PERIOD)
        .unwrap()
        .id()
        .unwrap();

    let weak = Arc::downgrade(&server);
    drop(server);
    assert!(weak.upgrade().is_none());

    fs::write(&files.cert, "cert-v2").unwrap();
    assert_eq!(scheduler.force_reload().await, vec![(id, false)]);

    // The task went away with its server.
    assert_eq!(scheduler.registry().len(), 0);
    assert_eq!(timer.len(), 0);
    assert!(scheduler.force_reload().await.is_empty());
}

#[tokio::test]
async fn test_dropped_servers_release_their_tasks() {
    init_tracing();
    let files = PemFiles::new("cert-v1", "key-v1");
    let (timer, scheduler) = manual_scheduler();

    for _ in 0..100 {
        let server = files.server();
        scheduler.start(&server, files.source(), PERIOD).unwrap();
    }
    assert_eq!(scheduler.registry().len(), 100);

    assert_eq!(timer.fire_all(), 100);
    assert_eq!(scheduler.registry().len(), 0);
    assert_eq!(timer.len(), 0);
}

#[tokio::test]
async fn test_pem_pair_wins_over_key_store() {
    init_tracing();
    let files = PemFiles::new("cert-v1", "key-v1");
    let key_store = files.cert.with_file_name("server.p12");
    fs::write(&key_store, b"keystore-bytes").unwrap();

    let server = Arc::new(SharedTlsConfig::new(TlsConfig::from_key_store(
        StoreOptions::new("PKCS12", b"keystore-bytes".to_vec()),
    )));
    let (_timer, scheduler) = manual_scheduler();
    let source = files.source().with_key_store(&key_store);
    let id = scheduler.start(&server, source, PERIOD).unwrap().id().unwrap();

    assert_eq!(scheduler.force_reload().await, vec![(id, true)]);

    let active = server.get().unwrap();
    assert!(active.key_store().is_none());
    let pem = active.pem().unwrap();
    assert_eq!(pem.certs, vec![b"cert-v1".to_vec()]);
    assert_eq!(pem.keys, vec![b"key-v1".to_vec()]);
}

/// Server that parses material more strictly than the builder.
struct StrictServer {
    tls: SharedTlsConfig,
    rejected: AtomicUsize,
}

#[async_trait]
impl TlsServer for StrictServer {
    fn active_tls_config(&self) -> Option<Arc<TlsConfig>> {
        self.tls.get()
    }

    async fn swap_tls_config(&self, candidate: TlsConfig) -> Result<bool> {
        let malformed = candidate
            .pem()
            .is_some_and(|pem| pem.certs.iter().any(|c| !c.starts_with(b"-----BEGIN")));
        if malformed {
            self.rejected.fetch_add(1, Ordering::SeqCst);
            return Err(ReloadError::Swap("certificate is not PEM encoded".to_string()));
        }
        self.tls.update(candidate).await
    }
}

#[tokio::test]
async fn test_swap_failure_keeps_serving_old_credentials() {
    init_tracing();
    let files = PemFiles::new("-----BEGIN v1", "key-v1");
    let initial = TlsConfig::from_pem(b"-----BEGIN v1".to_vec(), b"key-v1".to_vec());
    let server = Arc::new(StrictServer {
        tls: SharedTlsConfig::new(initial.clone()),
        rejected: AtomicUsize::new(0),
    });
    let (_timer, scheduler) = manual_scheduler();
    let id: TaskId = scheduler
        .start(&server, files.source(), PERIOD)
        .unwrap()
        .id()
        .unwrap();

    fs::write(&files.cert, "garbage").unwrap();
    assert_eq!(scheduler.force_reload().await, vec![(id, false)]);
    assert_eq!(server.rejected.load(Ordering::SeqCst), 1);
    assert_eq!(*server.tls.get().unwrap(), initial);

    fs::write(&files.cert, "-----BEGIN v2").unwrap();
    assert_eq!(scheduler.force_reload().await, vec![(id, true)]);
}
