//! Request debouncer
//!
//! Coalesces bursts of refresh requests so that at most one execution
//! happens per cooldown window. In the default non-immediate mode the first
//! request waits out the cooldown before executing, and every further
//! request inside the window folds into that single execution; an execution
//! opens another cooldown window behind itself.

use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::trace;

/// Work scheduled through the debouncer
pub type DebouncedFn = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

#[derive(Debug)]
enum DebounceState {
    Idle,
    /// Inside a cooldown window; `pending` records whether a run is owed
    /// when the window closes
    Cooldown { pending: bool },
    ShutDown,
}

/// Debouncer for a single async function
pub struct Debouncer {
    cooldown: Duration,
    immediate: bool,
    function: DebouncedFn,
    state: Arc<Mutex<DebounceState>>,
}

impl Debouncer {
    /// Create a debouncer
    ///
    /// With `immediate` set, the first call in a window executes right away
    /// and only the follow-ups wait; otherwise every execution happens at
    /// the end of a window.
    pub fn new(cooldown: Duration, immediate: bool, function: DebouncedFn) -> Self {
        Self {
            cooldown,
            immediate,
            function,
            state: Arc::new(Mutex::new(DebounceState::Idle)),
        }
    }

    /// Request an execution, coalescing with any other request in the
    /// current cooldown window
    pub async fn call(&self) {
        let mut state = self.state.lock().await;
        match &mut *state {
            DebounceState::Idle => {
                if self.immediate {
                    *state = DebounceState::Cooldown { pending: false };
                    drop(state);
                    (self.function)().await;
                } else {
                    *state = DebounceState::Cooldown { pending: true };
                    drop(state);
                }
                self.spawn_cooldown();
            }
            DebounceState::Cooldown { pending } => {
                trace!("request coalesced into open cooldown window");
                *pending = true;
            }
            DebounceState::ShutDown => {}
        }
    }

    /// Drop any owed execution and refuse future calls
    ///
    /// Used at teardown: a refresh still waiting out its cooldown is
    /// cancelled rather than executed.
    pub async fn shutdown(&self) {
        *self.state.lock().await = DebounceState::ShutDown;
    }

    fn spawn_cooldown(&self) {
        let state = Arc::clone(&self.state);
        let function = Arc::clone(&self.function);
        let cooldown = self.cooldown;

        tokio::spawn(async move {
            loop {
                tokio::time::sleep(cooldown).await;

                let run = {
                    let mut state = state.lock().await;
                    match &mut *state {
                        DebounceState::Cooldown { pending } if *pending => {
                            *pending = false;
                            true
                        }
                        DebounceState::ShutDown => return,
                        other => {
                            *other = DebounceState::Idle;
                            return;
                        }
                    }
                };

                if run {
                    function().await;
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting() -> (DebouncedFn, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let function: DebouncedFn = Arc::new(move || {
            let counter = Arc::clone(&counter);
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
            })
        });
        (function, count)
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_coalesces_to_one_execution() {
        let (function, count) = counting();
        let debouncer = Debouncer::new(Duration::from_secs(10), false, function);

        debouncer.call().await;
        debouncer.call().await;
        debouncer.call().await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_window_after_execution() {
        let (function, count) = counting();
        let debouncer = Debouncer::new(Duration::from_secs(10), false, function);

        debouncer.call().await;
        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        debouncer.call().await;
        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_mode_runs_first_call_now() {
        let (function, count) = counting();
        let debouncer = Debouncer::new(Duration::from_secs(10), true, function);

        debouncer.call().await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        // A follow-up inside the window is deferred to the window close
        debouncer.call().await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_owed_execution() {
        let (function, count) = counting();
        let debouncer = Debouncer::new(Duration::from_secs(10), false, function);

        debouncer.call().await;
        debouncer.shutdown().await;

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        // Calls after shutdown are refused outright
        debouncer.call().await;
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
