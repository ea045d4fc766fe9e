//! Thread-safe configuration manager with a background refresh loop

use crate::bind::Bindable;
use crate::error::{ConfigError, Result};
use crate::fetcher::{HttpFetcher, HttpFetcherConfig, SettingsFetcher};
use crate::types::Setting;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Callback invoked with the new setting after a perceivable change
pub type UpdateHandler = Arc<dyn Fn(&Setting) + Send + Sync>;

/// Snapshot map and handler registry, guarded together by one lock.
struct ManagerState {
    snapshot: HashMap<String, Setting>,
    handlers: HashMap<String, UpdateHandler>,
}

struct Inner {
    state: Mutex<ManagerState>,
    fetcher: Box<dyn SettingsFetcher>,
    refresh_interval: Duration,
    shutdown: broadcast::Sender<()>,
    stopped: AtomicBool,
}

/// Client-side cache of a remote configuration service.
///
/// Holds the last-known snapshot of settings, refreshes it on a timer via
/// [`run_refresh_loop`](Self::run_refresh_loop), fires per-key callbacks
/// when a value perceivably changes, and projects the snapshot onto plain
/// structures through their declared bindings. Cloning is cheap and yields
/// another handle to the same cache.
///
/// All access serializes through a single lock covering the snapshot, the
/// handler registry and handler dispatch. Reads hold it only for a map
/// lookup; the refresh loop's fetch runs before the lock is taken, so slow
/// network round-trips never stall readers.
#[derive(Clone)]
pub struct ConfigManager {
    inner: Arc<Inner>,
}

impl ConfigManager {
    /// Create a manager backed by `fetcher`, performing the initial fetch.
    ///
    /// # Errors
    ///
    /// Fails with [`ConfigError::Fetch`] when the initial fetch fails; no
    /// manager exists in that case.
    pub async fn new<F>(fetcher: F, refresh_interval: Duration) -> Result<Self>
    where
        F: SettingsFetcher + 'static,
    {
        let initial = fetcher.fetch().await?;
        info!(count = initial.len(), "initial configuration snapshot loaded");

        let (shutdown, _) = broadcast::channel(1);
        Ok(Self {
            inner: Arc::new(Inner {
                state: Mutex::new(ManagerState {
                    snapshot: into_snapshot(initial),
                    handlers: HashMap::new(),
                }),
                fetcher: Box::new(fetcher),
                refresh_interval,
                shutdown,
                stopped: AtomicBool::new(false),
            }),
        })
    }

    /// Create a manager that fetches over HTTP from `endpoint`, identifying
    /// itself to the configuration service as `service_name`.
    pub async fn connect(
        service_name: &str,
        endpoint: &str,
        refresh_interval: Duration,
    ) -> Result<Self> {
        let fetcher = HttpFetcher::new(HttpFetcherConfig::new(service_name, endpoint))?;
        Self::new(fetcher, refresh_interval).await
    }

    /// Current value for `key`, or `None` if the snapshot has no entry.
    ///
    /// A key the service never served and a key served but never applied
    /// both report `None`.
    pub fn get_param(&self, key: &str) -> Option<String> {
        self.inner.state.lock().snapshot.get(key).map(|s| s.value.clone())
    }

    /// Full stored setting for `key`, including its version timestamps
    pub fn get_setting(&self, key: &str) -> Option<Setting> {
        self.inner.state.lock().snapshot.get(key).cloned()
    }

    /// Register `handler` for every key in `keys`, replacing any handler a
    /// key already has. Takes effect for subsequent refresh cycles, not for
    /// one already in flight.
    ///
    /// Handlers run synchronously while the store lock is held: keep them
    /// short, and never call back into the manager from inside one.
    pub fn set_update_handler<F>(&self, handler: F, keys: &[&str])
    where
        F: Fn(&Setting) + Send + Sync + 'static,
    {
        let handler: UpdateHandler = Arc::new(handler);
        let mut state = self.inner.state.lock();
        for key in keys {
            state.handlers.insert((*key).to_string(), Arc::clone(&handler));
        }
    }

    /// Fetch once and apply perceivable changes to the snapshot.
    ///
    /// One cycle of the refresh loop, available on demand. The fetch runs
    /// without holding the store lock.
    pub async fn refresh_now(&self) -> Result<()> {
        let fetched = self.inner.fetcher.fetch().await?;
        self.apply(fetched);
        Ok(())
    }

    /// Run the refresh loop until [`shutdown`](Self::shutdown) is called.
    ///
    /// Sleeps `refresh_interval` between cycles. A failed fetch is logged
    /// and the cycle skipped with no mutation at all; fetch failures never
    /// terminate the loop. Callers normally use
    /// [`spawn_refresh_loop`](Self::spawn_refresh_loop) instead of awaiting
    /// this directly.
    pub async fn run_refresh_loop(&self) {
        let mut shutdown = self.inner.shutdown.subscribe();
        if self.inner.stopped.load(Ordering::SeqCst) {
            return;
        }
        info!(interval = ?self.inner.refresh_interval, "refresh loop started");

        loop {
            tokio::select! {
                _ = shutdown.recv() => break,
                _ = sleep(self.inner.refresh_interval) => {}
            }
            tokio::select! {
                _ = shutdown.recv() => break,
                refreshed = self.refresh_now() => {
                    if let Err(err) = refreshed {
                        warn!(error = %err, "refresh cycle skipped");
                    }
                }
            }
        }

        info!("refresh loop stopped");
    }

    /// Spawn [`run_refresh_loop`](Self::run_refresh_loop) as a background
    /// tokio task and return its handle.
    pub fn spawn_refresh_loop(&self) -> JoinHandle<()> {
        let manager = self.clone();
        tokio::spawn(async move { manager.run_refresh_loop().await })
    }

    /// Signal the refresh loop to stop. Idempotent. Takes effect at the
    /// loop's next await point, including mid-sleep and mid-fetch, so
    /// shutdown never waits out a full interval.
    pub fn shutdown(&self) {
        self.inner.stopped.store(true, Ordering::SeqCst);
        let _ = self.inner.shutdown.send(());
    }

    /// Materialize the current snapshot into `target` through its declared
    /// bindings.
    ///
    /// All bindings are resolved and converted under a single lock
    /// acquisition, so the result is a point-in-time projection; later
    /// refreshes do not update `target` retroactively. The operation is
    /// all-or-nothing: `target` is only written after every binding
    /// resolved and converted, so a failed call leaves it untouched.
    /// Fields without a declared binding are never written.
    ///
    /// # Errors
    ///
    /// [`ConfigError::MissingKey`] when a bound key is absent from the
    /// snapshot, [`ConfigError::Conversion`] when a value does not parse as
    /// its declared kind, [`ConfigError::UnsupportedType`] when the binding
    /// table itself declares an unsupported kind.
    pub fn populate<T: Bindable>(&self, target: &mut T) -> Result<()> {
        let table = T::bindings()?;
        let mut staged = Vec::with_capacity(table.len());
        {
            let state = self.inner.state.lock();
            for binding in table.entries() {
                let setting = state
                    .snapshot
                    .get(binding.key)
                    .ok_or_else(|| ConfigError::missing_key(binding.key))?;
                staged.push((binding.write, binding.kind.convert(binding.field, &setting.value)?));
            }
        }
        for (write, value) in staged {
            write(target, value);
        }
        Ok(())
    }

    /// Diff `fetched` against the snapshot and apply perceivable changes.
    ///
    /// A change is perceivable iff the incoming `updated` is strictly later
    /// than the stored one AND the value differs. Touches (a newer timestamp
    /// with an unchanged value) and timestamp regressions (an older or equal
    /// timestamp, whatever the value) are discarded, giving
    /// last-writer-wins-by-timestamp per key. Keys present in the store but
    /// absent from `fetched` are left untouched: deletions do not propagate.
    fn apply(&self, fetched: Vec<Setting>) {
        let mut state = self.inner.state.lock();
        for incoming in fetched {
            let (old_updated, old_value) = match state.snapshot.get(&incoming.key) {
                Some(old) => (old.updated, old.value.as_str()),
                // Unknown keys diff against the zero-value setting.
                None => (DateTime::<Utc>::MIN_UTC, ""),
            };
            if incoming.updated <= old_updated || incoming.value == old_value {
                continue;
            }

            debug!(key = %incoming.key, "setting changed");
            let handler = state.handlers.get(&incoming.key).cloned();
            state.snapshot.insert(incoming.key.clone(), incoming.clone());
            if let Some(handler) = handler {
                handler(&incoming);
            }
        }
    }
}

/// Collapse the wire list into a keyed snapshot; later duplicates win.
fn into_snapshot(settings: Vec<Setting>) -> HashMap<String, Setting> {
    settings.into_iter().map(|s| (s.key.clone(), s)).collect()
}
