use crate::runtime::{LocalTask, TaskRuntime};
use std::cell::{Cell, RefCell};
use std::time::Duration;

pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(1500);

struct Pending<T, P> {
    generation: u64,
    payload: P,
    // Dropping the handle cancels the timer.
    _timer: T,
}

/// Debounced trigger.
///
/// Every `arm` replaces whatever was pending and restarts the quiet period, so a
/// burst of edits yields a single fire carrying the payload of the last arm.
pub(crate) struct AutosaveScheduler<R: TaskRuntime, P> {
    runtime: R,
    quiet_period: Duration,
    generation: Cell<u64>,
    pending: RefCell<Option<Pending<R::Timer, P>>>,
}

impl<R: TaskRuntime, P> AutosaveScheduler<R, P> {
    pub fn new(runtime: R, quiet_period: Duration) -> Self {
        Self {
            runtime,
            quiet_period,
            generation: Cell::new(0),
            pending: RefCell::new(None),
        }
    }

    /// (Re)start the quiet period. `fire` builds the task run when it elapses;
    /// that task is expected to call [`Self::take_due`] with the generation it
    /// was given.
    pub fn arm(&self, payload: P, fire: impl FnOnce(u64) -> LocalTask) {
        let generation = self.generation.get() + 1;
        self.generation.set(generation);

        let timer = self.runtime.delay(self.quiet_period, fire(generation));
        let previous = self.pending.replace(Some(Pending {
            generation,
            payload,
            _timer: timer,
        }));
        drop(previous);
    }

    /// Claim the payload for a timer that just fired. Returns `None` when a
    /// newer arm superseded it or the entry was cancelled or flushed.
    pub fn take_due(&self, generation: u64) -> Option<P> {
        let mut pending = self.pending.borrow_mut();
        let current = pending
            .as_ref()
            .is_some_and(|p| p.generation == generation);
        if current {
            pending.take().map(|p| p.payload)
        } else {
            None
        }
    }

    /// Take the pending payload now, without waiting for the quiet period.
    pub fn flush(&self) -> Option<P> {
        self.pending.take().map(|p| p.payload)
    }

    pub fn cancel(&self) {
        drop(self.pending.take());
    }

    pub fn is_armed(&self) -> bool {
        self.pending.borrow().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::manual::ManualRuntime;
    use std::rc::Rc;

    type Fired = Rc<RefCell<Vec<&'static str>>>;

    fn arm(s: &Rc<AutosaveScheduler<ManualRuntime, &'static str>>, fired: &Fired, value: &'static str) {
        let s2 = Rc::clone(s);
        let fired = Rc::clone(fired);
        s.arm(value, move |generation| {
            Box::pin(async move {
                if let Some(v) = s2.take_due(generation) {
                    fired.borrow_mut().push(v);
                }
            })
        });
    }

    fn setup() -> (ManualRuntime, Rc<AutosaveScheduler<ManualRuntime, &'static str>>, Fired) {
        let rt = ManualRuntime::default();
        let s = Rc::new(AutosaveScheduler::new(rt.clone(), DEFAULT_QUIET_PERIOD));
        (rt, s, Rc::new(RefCell::new(vec![])))
    }

    #[tokio::test]
    async fn test_burst_coalesces_into_one_fire_with_last_payload() {
        let (rt, s, fired) = setup();

        arm(&s, &fired, "a");
        rt.advance(Duration::from_millis(500));
        arm(&s, &fired, "ab");
        rt.advance(Duration::from_millis(500));
        arm(&s, &fired, "abc");
        rt.advance(Duration::from_millis(1499));
        rt.run_until_idle().await;
        assert!(fired.borrow().is_empty());

        rt.advance(Duration::from_millis(1));
        rt.run_until_idle().await;
        assert_eq!(*fired.borrow(), vec!["abc"]);
        assert!(!s.is_armed());
    }

    #[tokio::test]
    async fn test_cancel_prevents_fire() {
        let (rt, s, fired) = setup();
        arm(&s, &fired, "x");
        s.cancel();
        assert_eq!(rt.live_timers(), 0);

        rt.advance(Duration::from_secs(5));
        rt.run_until_idle().await;
        assert!(fired.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_flush_takes_payload_and_disarms() {
        let (rt, s, fired) = setup();
        arm(&s, &fired, "x");
        assert_eq!(s.flush(), Some("x"));
        assert!(!s.is_armed());

        rt.advance(Duration::from_secs(5));
        rt.run_until_idle().await;
        assert!(fired.borrow().is_empty());
    }

    #[test]
    fn test_stale_generation_is_ignored() {
        let (_rt, s, fired) = setup();
        arm(&s, &fired, "old");
        arm(&s, &fired, "new");
        assert_eq!(s.take_due(1), None);
        assert_eq!(s.take_due(2), Some("new"));
    }
}
