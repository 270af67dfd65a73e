//! Network reachability signal

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Boolean signal consulted before remote calls
pub trait Reachability: Clone + Send + Sync + 'static {
    fn is_reachable(&self) -> bool;
}

/// Reachability flag updated by whatever monitors the network
#[derive(Clone, Debug)]
pub struct NetworkMonitor {
    online: Arc<AtomicBool>,
}

impl NetworkMonitor {
    pub fn new(online: bool) -> Self {
        Self {
            online: Arc::new(AtomicBool::new(online)),
        }
    }

    /// Assume connectivity until told otherwise.
    pub fn online() -> Self {
        Self::new(true)
    }

    pub fn set_online(&self, online: bool) {
        let previous = self.online.swap(online, Ordering::SeqCst);
        if previous != online {
            tracing::debug!("Network reachability changed: online={}", online);
        }
    }
}

impl Default for NetworkMonitor {
    fn default() -> Self {
        Self::online()
    }
}

impl Reachability for NetworkMonitor {
    fn is_reachable(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_observe_updates() {
        let monitor = NetworkMonitor::online();
        let observer = monitor.clone();
        assert!(observer.is_reachable());

        monitor.set_online(false);
        assert!(!observer.is_reachable());
    }
}
