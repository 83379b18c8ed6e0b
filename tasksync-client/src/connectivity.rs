use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Answers "is the network reachable right now?".
///
/// Queried immediately before every online/offline branch; implementations
/// must not cache and must not have side effects.
pub trait Connectivity: Send + Sync {
    fn is_online(&self) -> bool;
}

impl<F> Connectivity for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn is_online(&self) -> bool {
        self()
    }
}

/// Shared switch flipped by whatever watches the host network.
#[derive(Debug, Clone, Default)]
pub struct ConnectivityFlag {
    online: Arc<AtomicBool>,
}

impl ConnectivityFlag {
    pub fn new(online: bool) -> Self {
        Self {
            online: Arc::new(AtomicBool::new(online)),
        }
    }

    pub fn set_online(&self, online: bool) {
        let previous = self.online.swap(online, Ordering::SeqCst);
        if previous != online {
            tracing::info!(online, "Connectivity changed");
        }
    }
}

impl Connectivity for ConnectivityFlag {
    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_is_shared_between_clones() {
        let flag = ConnectivityFlag::new(false);
        let observer = flag.clone();

        assert!(!observer.is_online());
        flag.set_online(true);
        assert!(observer.is_online());
    }

    #[test]
    fn test_closure_oracle() {
        let oracle = || true;
        assert!(Connectivity::is_online(&oracle));
    }
}
