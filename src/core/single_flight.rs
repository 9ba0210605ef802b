use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared "one at a time" flag.
///
/// Clones observe and contend for the same flag, so a UI collaborator can hold
/// a clone and poll [`SingleFlight::is_busy`] to disable its input surface
/// while the owner runs an operation.
#[derive(Clone, Debug, Default)]
pub struct SingleFlight {
    busy: Arc<AtomicBool>,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the flag. Returns `None` when another operation already holds it.
    pub fn try_acquire(&self) -> Option<FlightGuard> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FlightGuard {
                busy: Arc::clone(&self.busy),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Releases the flag when dropped.
#[derive(Debug)]
pub struct FlightGuard {
    busy: Arc<AtomicBool>,
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_until_guard_drops() {
        let flight = SingleFlight::new();
        let guard = flight.try_acquire().expect("first acquire");
        assert!(flight.is_busy());
        assert!(flight.try_acquire().is_none());

        drop(guard);
        assert!(!flight.is_busy());
        assert!(flight.try_acquire().is_some());
    }

    #[test]
    fn clones_share_the_same_flag() {
        let flight = SingleFlight::new();
        let observer = flight.clone();
        let _guard = flight.try_acquire().expect("acquire");
        assert!(observer.is_busy());
        assert!(observer.try_acquire().is_none());
    }
}
