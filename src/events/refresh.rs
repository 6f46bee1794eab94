use super::network::{Event, Handler};
use crate::api::ApiService;
use crate::state::DashboardState;
use anyhow::Result;
use log::*;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{self, MissedTickBehavior};

/// Refresh the dashboard every `every` until `shutdown` resolves. The
/// first refresh runs immediately. `on_refresh` sees the state after each
/// round, whether or not every part succeeded.
///
pub async fn run<F, S>(
    api: Arc<ApiService>,
    state: Arc<Mutex<DashboardState>>,
    region: Option<String>,
    every: Duration,
    shutdown: S,
    mut on_refresh: F,
) -> Result<()>
where
    F: FnMut(&DashboardState),
    S: Future<Output = ()>,
{
    info!("Refreshing dashboard every {}s", every.as_secs());
    let mut ticker = time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Stopping dashboard refresh");
                break;
            }
            _ = ticker.tick() => {
                let handler = Handler::new(&state, &api).with_region(region.clone());
                if let Err(e) = handler.handle(Event::RefreshAll).await {
                    warn!("Dashboard refresh incomplete: {}", e);
                }
                on_refresh(&*state.lock().await);
            }
        }
    }
    Ok(())
}
