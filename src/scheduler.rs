//! Cooperative, time-triggered task scheduler. See spec.md §4.8.
//!
//! Tasks are registered once at bring-up, in descending priority order; the
//! tick ISR (`tick()`) advances every task's sub-tick counter and raises a
//! ready flag whenever one wraps. The scheduler itself never invokes
//! application code directly — RTIC's `#[idle]` task needs its own
//! `cx.shared` lock context to touch shared state, which a bare `fn()`
//! stored in the table couldn't carry — so `poll()` only hands back the
//! identity of the next ready task, in priority order, for `#[idle]` to
//! match on and dispatch itself.

use heapless::Vec;

use crate::config::MAX_SCHEDULER_TASKS;

struct TaskSlot<T> {
    id: T,
    period_ticks: u16,
    counter: u16,
    ready: bool,
}

/// Fixed-capacity, priority-ordered task table. `T` identifies a task (an
/// application-defined enum, typically); capacity is `MAX_SCHEDULER_TASKS`.
pub struct Scheduler<T: Copy> {
    tasks: Vec<TaskSlot<T>, MAX_SCHEDULER_TASKS>,
}

impl<T: Copy> Scheduler<T> {
    pub fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    /// Registers a task identified by `id`, with the given period in
    /// ticks. Priority is implicit: earlier registrations win ties when
    /// more than one task is ready on the same pass. A zero period is a
    /// configuration error, asserted in debug builds and otherwise treated
    /// as 1 (the task runs every tick).
    pub fn register(&mut self, id: T, period_ticks: u16) {
        debug_assert!(period_ticks > 0, "task period must be nonzero");
        let period_ticks = period_ticks.max(1);
        let slot = TaskSlot {
            id,
            period_ticks,
            counter: 0,
            ready: false,
        };
        if self.tasks.push(slot).is_err() {
            debug_assert!(false, "scheduler task table is full");
        }
    }

    /// Advances every task's sub-tick counter by one tick. Called from the
    /// hardware tick ISR, at `F_TICK`. A task's ready flag is set (but
    /// never cleared here) whenever its counter wraps back to zero;
    /// `poll` clears the flag once the caller actually dispatches the
    /// task, so a tick arriving while the previous invocation is still
    /// pending just leaves the flag set rather than losing the request.
    pub fn tick(&mut self) {
        for task in self.tasks.iter_mut() {
            task.counter += 1;
            if task.counter >= task.period_ticks {
                task.counter = 0;
                task.ready = true;
            }
        }
    }

    /// Scans the task table from the top and returns the identity of the
    /// first ready task, clearing its flag. Returns `None` if nothing is
    /// ready. Calling this repeatedly until it returns `None` dispatches
    /// every currently-ready task, highest priority first; a task that
    /// becomes ready mid-scan is picked up on the next call rather than
    /// the current one, so a flood of low-priority readiness can never
    /// starve a high-priority task queued behind it.
    pub fn poll(&mut self) -> Option<T> {
        for task in self.tasks.iter_mut() {
            if task.ready {
                task.ready = false;
                return Some(task.id);
            }
        }
        None
    }
}

impl<T: Copy> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    enum TestTask {
        High,
        Low,
    }

    #[test]
    fn task_runs_only_after_its_period_elapses() {
        let mut sched: Scheduler<TestTask> = Scheduler::new();
        sched.register(TestTask::High, 4);

        for _ in 0..3 {
            sched.tick();
            assert_eq!(sched.poll(), None);
        }
        sched.tick();
        assert_eq!(sched.poll(), Some(TestTask::High));
        assert_eq!(sched.poll(), None);
    }

    #[test]
    fn higher_priority_task_runs_before_lower_priority_one() {
        let mut sched: Scheduler<TestTask> = Scheduler::new();
        sched.register(TestTask::High, 1);
        sched.register(TestTask::Low, 1);

        sched.tick();
        assert_eq!(sched.poll(), Some(TestTask::High));
        assert_eq!(sched.poll(), Some(TestTask::Low));
        assert_eq!(sched.poll(), None);
    }

    #[test]
    fn missed_run_stays_pending_across_further_ticks() {
        let mut sched: Scheduler<TestTask> = Scheduler::new();
        sched.register(TestTask::High, 2);

        sched.tick();
        sched.tick();
        sched.tick();
        sched.tick();
        assert_eq!(sched.poll(), Some(TestTask::High));
        assert_eq!(sched.poll(), None);
    }

    #[test]
    fn independent_tasks_can_both_be_ready_at_once() {
        let mut sched: Scheduler<TestTask> = Scheduler::new();
        sched.register(TestTask::High, 2);
        sched.register(TestTask::Low, 2);

        sched.tick();
        sched.tick();
        assert_eq!(sched.poll(), Some(TestTask::High));
        assert_eq!(sched.poll(), Some(TestTask::Low));
    }
}
