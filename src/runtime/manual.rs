//! Deterministic runtime for tests: a virtual clock and explicit draining.

use super::{LocalTask, TaskRuntime};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

struct TimerEntry {
    due: Duration,
    cancelled: Rc<Cell<bool>>,
    task: LocalTask,
}

#[derive(Default)]
struct Queue {
    now: Duration,
    ready: VecDeque<LocalTask>,
    timers: Vec<TimerEntry>,
}

#[derive(Clone, Default)]
pub(crate) struct ManualRuntime {
    queue: Rc<RefCell<Queue>>,
}

pub(crate) struct ManualTimer {
    cancelled: Rc<Cell<bool>>,
}

impl Drop for ManualTimer {
    fn drop(&mut self) {
        self.cancelled.set(true);
    }
}

impl ManualRuntime {
    /// Move the clock forward, queueing every live timer that became due.
    pub(crate) fn advance(&self, by: Duration) {
        let mut q = self.queue.borrow_mut();
        q.now += by;
        let now = q.now;

        let timers = std::mem::take(&mut q.timers);
        let (mut due, pending): (Vec<_>, Vec<_>) = timers.into_iter().partition(|t| t.due <= now);
        q.timers = pending;

        due.sort_by_key(|t| t.due);
        for t in due {
            if !t.cancelled.get() {
                q.ready.push_back(t.task);
            }
        }
    }

    /// Run queued tasks (and whatever they spawn) to completion.
    pub(crate) async fn run_until_idle(&self) {
        loop {
            let next = self.queue.borrow_mut().ready.pop_front();
            match next {
                Some(task) => task.await,
                None => break,
            }
        }
    }

    pub(crate) fn live_timers(&self) -> usize {
        self.queue
            .borrow()
            .timers
            .iter()
            .filter(|t| !t.cancelled.get())
            .count()
    }
}

impl TaskRuntime for ManualRuntime {
    type Timer = ManualTimer;

    fn spawn(&self, task: LocalTask) {
        self.queue.borrow_mut().ready.push_back(task);
    }

    fn delay(&self, after: Duration, task: LocalTask) -> ManualTimer {
        let cancelled = Rc::new(Cell::new(false));
        let mut q = self.queue.borrow_mut();
        let due = q.now + after;
        q.timers.push(TimerEntry {
            due,
            cancelled: cancelled.clone(),
            task,
        });
        ManualTimer { cancelled }
    }
}
