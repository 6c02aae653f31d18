use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

#[cfg(test)]
pub(crate) mod manual;

/// A unit of work for the single-threaded event loop.
pub type LocalTask = Pin<Box<dyn Future<Output = ()>>>;

/// Where background work and timers run.
///
/// Dropping a timer handle returned by [`TaskRuntime::delay`] cancels it.
pub trait TaskRuntime: Clone + 'static {
    type Timer: 'static;

    fn spawn(&self, task: LocalTask);

    fn delay(&self, after: Duration, task: LocalTask) -> Self::Timer;
}

/// Browser event loop: `spawn_local` for tasks, `setTimeout` for timers.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserRuntime;

impl TaskRuntime for BrowserRuntime {
    type Timer = gloo_timers::callback::Timeout;

    fn spawn(&self, task: LocalTask) {
        leptos::task::spawn_local(task);
    }

    fn delay(&self, after: Duration, task: LocalTask) -> Self::Timer {
        let millis = timeout_millis(after);
        gloo_timers::callback::Timeout::new(millis, move || {
            leptos::task::spawn_local(task);
        })
    }
}

/// `setTimeout` treats anything past `i32::MAX` ms as zero.
pub(crate) fn timeout_millis(after: Duration) -> u32 {
    u32::try_from(after.as_millis())
        .unwrap_or(u32::MAX)
        .min(i32::MAX as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_millis_saturates_at_browser_limit() {
        assert_eq!(timeout_millis(Duration::from_millis(1500)), 1500);
        assert_eq!(timeout_millis(Duration::from_millis(i32::MAX as u64)), i32::MAX as u32);
        assert_eq!(timeout_millis(Duration::from_millis(u32::MAX as u64)), i32::MAX as u32);
        assert_eq!(timeout_millis(Duration::from_secs(u64::MAX)), i32::MAX as u32);
    }
}
