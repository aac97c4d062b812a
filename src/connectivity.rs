use std::fmt;

use tokio::sync::watch;
use tracing::{info, warn};

/// Network reachability as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    Wifi,
    Cellular,
    Other,
    Offline,
}

impl Connectivity {
    pub fn is_online(self) -> bool {
        !matches!(self, Connectivity::Offline)
    }
}

impl fmt::Display for Connectivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Connectivity::Wifi => "WiFi",
            Connectivity::Cellular => "4G",
            Connectivity::Other => "other network",
            Connectivity::Offline => "offline",
        };
        f.write_str(label)
    }
}

/// Connectivity signal source. The platform layer pushes changes with
/// [`ConnectivityMonitor::set`]; screens read or subscribe.
#[derive(Debug, Clone)]
pub struct ConnectivityMonitor {
    tx: watch::Sender<Connectivity>,
}

impl ConnectivityMonitor {
    pub fn new(initial: Connectivity) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    pub fn current(&self) -> Connectivity {
        *self.tx.borrow()
    }

    pub fn is_online(&self) -> bool {
        self.current().is_online()
    }

    /// Record a new state; subscribers are only woken on actual changes.
    pub fn set(&self, state: Connectivity) {
        let changed = self.tx.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });

        if changed {
            if state.is_online() {
                info!("📶 Connected ({state})");
            } else {
                warn!("📵 Connection lost");
            }
        }
    }

    /// A request reached the server. Only leaves `Offline`; a known link
    /// kind reported by the platform is kept.
    pub fn mark_reachable(&self) {
        if !self.is_online() {
            self.set(Connectivity::Other);
        }
    }

    /// A request failed before any response came back.
    pub fn mark_unreachable(&self) {
        self.set(Connectivity::Offline);
    }

    pub fn subscribe(&self) -> watch::Receiver<Connectivity> {
        self.tx.subscribe()
    }
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new(Connectivity::Other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let monitor = ConnectivityMonitor::new(Connectivity::Wifi);
        let mut rx = monitor.subscribe();
        assert!(monitor.is_online());

        monitor.set(Connectivity::Offline);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), Connectivity::Offline);
        assert!(!monitor.is_online());
    }

    #[test]
    fn test_reachability_marks() {
        let monitor = ConnectivityMonitor::new(Connectivity::Wifi);
        monitor.mark_reachable();
        assert_eq!(monitor.current(), Connectivity::Wifi);

        monitor.mark_unreachable();
        assert!(!monitor.is_online());
        monitor.mark_reachable();
        assert_eq!(monitor.current(), Connectivity::Other);
    }

    #[test]
    fn test_same_state_is_not_a_change() {
        let monitor = ConnectivityMonitor::new(Connectivity::Cellular);
        let rx = monitor.subscribe();

        monitor.set(Connectivity::Cellular);
        assert!(!rx.has_changed().unwrap());
    }
}
