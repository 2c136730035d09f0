use campus_nest::error::AppError;
use campus_nest::store::{InMemoryEntityStore, SeedData};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Hydrates the store from a JSON snapshot, or starts empty when no path is configured.
pub(crate) fn load_store(seed: Option<&Path>) -> Result<InMemoryEntityStore, AppError> {
    match seed {
        Some(path) => {
            let store = SeedData::from_path(path)?.into_store()?;
            info!(seed = %path.display(), "store hydrated from seed snapshot");
            Ok(store)
        }
        None => {
            warn!("no seed snapshot configured; starting with an empty store");
            Ok(InMemoryEntityStore::new())
        }
    }
}

/// Resolves once Ctrl-C arrives, after telling background tasks to stop.
pub(crate) async fn shutdown_signal(readiness: Arc<AtomicBool>, shutdown: watch::Sender<bool>) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        return;
    }
    info!("shutdown requested");
    readiness.store(false, std::sync::atomic::Ordering::Release);
    shutdown.send_replace(true);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_seed_starts_empty() {
        use campus_nest::store::{EntityStore, UserFilter};

        let store = load_store(None).expect("empty store");
        assert_eq!(store.count_users(&UserFilter::students()).expect("count"), 0);
    }

    #[test]
    fn unreadable_seed_is_reported() {
        let path = std::env::temp_dir().join("campus-nest-no-such-seed.json");
        let err = load_store(Some(&path)).expect_err("missing file");
        assert!(matches!(err, AppError::Seed(_)));
    }
}
