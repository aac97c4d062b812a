//! Background tasks keeping the operator informed about the server link.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::api::PalletApi;
use crate::connectivity::{Connectivity, ConnectivityMonitor};

use super::say;

pub fn link_banner(state: Connectivity) -> String {
    if state.is_online() {
        format!("📶 Connected via {state}")
    } else {
        "📵 Connection lost, server commands are paused".to_string()
    }
}

/// Print a banner on every connectivity change until `stop` fires.
pub fn spawn_link_banner(monitor: &ConnectivityMonitor, stop: CancellationToken) -> JoinHandle<()> {
    let mut rx = monitor.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                _ = stop.cancelled() => break,
                changed = rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let state = *rx.borrow_and_update();
                    say(link_banner(state));
                }
            }
        }
    })
}

/// While offline, contact the server every `every` until it answers.
pub fn spawn_link_check(
    api: Arc<PalletApi>,
    every: Duration,
    stop: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                biased;
                _ = stop.cancelled() => break,
                _ = ticker.tick() => {
                    if !api.session().is_online() && api.check_link().await {
                        info!("📶 Server reachable again");
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::TOKEN_KEY;
    use crate::credentials::MemoryCredentialStore;
    use crate::session::SessionContext;
    use crate::transport::scripted::ScriptedTransport;

    #[test]
    fn test_banners() {
        assert_eq!(link_banner(Connectivity::Wifi), "📶 Connected via WiFi");
        assert!(link_banner(Connectivity::Offline).starts_with("📵"));
    }

    #[tokio::test]
    async fn test_link_check_restores_online_state() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.fail("connection refused").reply(404, "");
        let monitor = ConnectivityMonitor::new(Connectivity::Offline);
        let session = Arc::new(SessionContext::new(
            Arc::new(MemoryCredentialStore::with_entry(TOKEN_KEY, "jwt")),
            monitor.clone(),
        ));
        let api = Arc::new(PalletApi::new(transport.clone(), session));
        let stop = CancellationToken::new();
        let mut rx = monitor.subscribe();

        let task = spawn_link_check(api, Duration::from_millis(10), stop.clone());
        tokio::time::timeout(Duration::from_secs(2), rx.wait_for(|c| c.is_online()))
            .await
            .expect("link never came back")
            .unwrap();

        stop.cancel();
        task.await.unwrap();
        assert_eq!(monitor.current(), Connectivity::Other);
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn test_no_requests_while_online() {
        let transport = Arc::new(ScriptedTransport::new());
        let session = Arc::new(SessionContext::new(
            Arc::new(MemoryCredentialStore::new()),
            ConnectivityMonitor::new(Connectivity::Wifi),
        ));
        let api = Arc::new(PalletApi::new(transport.clone(), session));
        let stop = CancellationToken::new();

        let task = spawn_link_check(api, Duration::from_millis(5), stop.clone());
        tokio::time::sleep(Duration::from_millis(30)).await;
        stop.cancel();
        task.await.unwrap();

        assert_eq!(transport.request_count(), 0);
    }
}
