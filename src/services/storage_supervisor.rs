use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::{roster_store::RosterRepository, storage::StorageError},
    services::persistence::bounded,
    state::SharedState,
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_RECONNECT_ATTEMPTS: u32 = 3;

/// Reconnect to the storage backend and keep the shared state in degraded mode when it is unavailable.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn RosterRepository>, StorageError>> + Send,
{
    let mut delay = INITIAL_DELAY;

    loop {
        match connect().await {
            Ok(store) => {
                state.set_repository(store.clone()).await;
                info!("storage connection established; leaving degraded mode");
                warm_snapshot(&state, store.as_ref()).await;
                delay = INITIAL_DELAY;

                loop {
                    match store.health_check().await {
                        Ok(()) => {
                            if state.is_degraded().await {
                                info!("storage healthy again; leaving degraded mode");
                                state.update_degraded(false).await;
                            }
                            sleep(HEALTH_POLL_INTERVAL).await;
                        }
                        Err(_) => {
                            let mut attempt = 0;
                            let mut reconnect_delay = INITIAL_DELAY;
                            let mut reconnected = false;

                            while attempt < MAX_RECONNECT_ATTEMPTS {
                                match store.try_reconnect().await {
                                    Ok(()) => {
                                        info!(
                                            "storage reconnection succeeded after health check failure"
                                        );
                                        reconnected = true;
                                        break;
                                    }
                                    Err(reconnect_err) => {
                                        if attempt == 0 {
                                            warn!(
                                                attempt, error = %reconnect_err,
                                                "storage reconnect first attempt failed; entering in degraded mode"
                                            );
                                            state.update_degraded(true).await;
                                        } else {
                                            warn!(attempt, error = %reconnect_err, "storage reconnect attempt failed");
                                        };
                                        attempt += 1;
                                        sleep(reconnect_delay).await;
                                        reconnect_delay = (reconnect_delay * 2).min(MAX_DELAY);
                                    }
                                }
                            }

                            if reconnected {
                                state.update_degraded(false).await;
                                warm_snapshot(&state, store.as_ref()).await;
                                sleep(HEALTH_POLL_INTERVAL).await;
                                continue;
                            } else {
                                warn!(
                                    "exhausted storage reconnect attempts; staying in degraded mode"
                                );
                                break;
                            }
                        }
                    }
                }

                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
            Err(err) => {
                warn!(error = %err, "storage connection attempt failed");
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
        }
    }
}

/// Load every stored division into the snapshot so reads work before the first listing.
async fn warm_snapshot(state: &SharedState, store: &dyn RosterRepository) {
    match bounded(state, store.list(None)).await {
        Ok(divisions) => {
            let count = divisions.len();
            state.rosters().resync(None, divisions).await;
            info!(divisions = count, "roster snapshot loaded from storage");
        }
        Err(err) => warn!(error = %err, "failed to load roster snapshot"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        dao::roster_store::memory::InMemoryRosterStore,
        state::{AppState, roster::Division},
    };

    #[tokio::test]
    async fn installs_repository_and_warms_snapshot() {
        let state = AppState::new(AppConfig::default());
        let repository = InMemoryRosterStore::with_documents([Division::new("U15", "2026")]);

        let supervisor = tokio::spawn(run(state.clone(), move || {
            let repository = repository.clone();
            async move { Ok::<_, StorageError>(Arc::new(repository) as Arc<dyn RosterRepository>) }
        }));

        for _ in 0..100 {
            if !state.rosters().list(None).await.is_empty() {
                break;
            }
            sleep(Duration::from_millis(10)).await;
        }
        supervisor.abort();

        assert!(!state.is_degraded().await);
        assert_eq!(state.rosters().list(None).await.len(), 1);
    }
}
