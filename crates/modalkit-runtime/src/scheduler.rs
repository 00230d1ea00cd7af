#![forbid(unsafe_code)]

//! Cooperative frame and timer scheduler.
//!
//! The [`Scheduler`] keeps two queues:
//!
//! - **frame callbacks**, run by [`Scheduler::run_frame`] once per rendered
//!   frame (the equivalent of `requestAnimationFrame`), and
//! - **timers**, run by [`Scheduler::advance`] when the virtual clock passes
//!   their deadline.
//!
//! The clock only moves when the host advances it, either by a delta
//! ([`advance`](Scheduler::advance)) or to a wall-clock instant
//! ([`tick`](Scheduler::tick)). That keeps every suspension point explicit and
//! makes tests deterministic.
//!
//! # Invariants
//!
//! 1. Callbacks never run while the scheduler is borrowed, so a callback may
//!    schedule or cancel other tasks.
//! 2. A frame callback queued during `run_frame` runs on the *next* frame.
//! 3. Timers fire in deadline order; equal deadlines fire in scheduling order.
//! 4. A cancelled task never runs; cancelling twice is a no-op.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use web_time::Instant;

/// Identifier of a scheduled frame callback or timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

type Task = Box<dyn FnOnce()>;

struct Timer {
    id: TaskId,
    deadline: Duration,
    task: Task,
}

struct SchedulerInner {
    now: Duration,
    origin: Option<Instant>,
    next_id: u64,
    frames: Vec<(TaskId, Task)>,
    timers: Vec<Timer>,
    frame_count: u64,
}

impl SchedulerInner {
    fn next_id(&mut self) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Remove and return the earliest timer due at or before `limit`.
    fn pop_due(&mut self, limit: Duration) -> Option<Timer> {
        let idx = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.deadline <= limit)
            .min_by_key(|(_, t)| (t.deadline, t.id))
            .map(|(i, _)| i)?;
        Some(self.timers.remove(idx))
    }
}

/// Shared handle to a frame/timer scheduler. Clones share the same queues.
#[derive(Clone)]
pub struct Scheduler {
    inner: Rc<RefCell<SchedulerInner>>,
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Scheduler")
            .field("now", &inner.now)
            .field("frames", &inner.frames.len())
            .field("timers", &inner.timers.len())
            .finish()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    /// Create an idle scheduler at virtual time zero.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(SchedulerInner {
                now: Duration::ZERO,
                origin: None,
                next_id: 1,
                frames: Vec::new(),
                timers: Vec::new(),
                frame_count: 0,
            })),
        }
    }

    /// Current virtual time since creation.
    pub fn now(&self) -> Duration {
        self.inner.borrow().now
    }

    /// Number of frames run so far.
    pub fn frame_count(&self) -> u64 {
        self.inner.borrow().frame_count
    }

    /// Queue `task` for the next frame.
    pub fn request_frame(&self, task: impl FnOnce() + 'static) -> TaskId {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id();
        inner.frames.push((id, Box::new(task)));
        tracing::trace!(task = id.0, "frame callback queued");
        id
    }

    /// Run `task` once `delay` of virtual time has passed.
    pub fn set_timeout(&self, delay: Duration, task: impl FnOnce() + 'static) -> TaskId {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id();
        let deadline = inner.now + delay;
        inner.timers.push(Timer {
            id,
            deadline,
            task: Box::new(task),
        });
        tracing::trace!(task = id.0, ?delay, "timer scheduled");
        id
    }

    /// Cancel a pending frame callback or timer. Returns `true` if it was pending.
    pub fn cancel(&self, id: TaskId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.frames.len() + inner.timers.len();
        inner.frames.retain(|(f, _)| *f != id);
        inner.timers.retain(|t| t.id != id);
        before != inner.frames.len() + inner.timers.len()
    }

    /// Whether `id` is still queued.
    pub fn is_pending(&self, id: TaskId) -> bool {
        let inner = self.inner.borrow();
        inner.frames.iter().any(|(f, _)| *f == id) || inner.timers.iter().any(|t| t.id == id)
    }

    pub fn pending_frames(&self) -> usize {
        self.inner.borrow().frames.len()
    }

    pub fn pending_timers(&self) -> usize {
        self.inner.borrow().timers.len()
    }

    /// Run every frame callback queued before this call. Returns how many ran.
    pub fn run_frame(&self) -> usize {
        let batch = {
            let mut inner = self.inner.borrow_mut();
            inner.frame_count += 1;
            std::mem::take(&mut inner.frames)
        };
        let count = batch.len();
        for (_, task) in batch {
            task();
        }
        if count > 0 {
            tracing::trace!(count, "frame callbacks ran");
        }
        count
    }

    /// Advance the virtual clock by `delta`, firing due timers in order.
    ///
    /// Timers scheduled by a firing timer run in the same call if their
    /// deadline also falls within the window. Returns how many fired.
    pub fn advance(&self, delta: Duration) -> usize {
        let target = self.inner.borrow().now + delta;
        let mut fired = 0;
        loop {
            let due = {
                let mut inner = self.inner.borrow_mut();
                let due = inner.pop_due(target);
                if let Some(timer) = &due {
                    inner.now = inner.now.max(timer.deadline);
                }
                due
            };
            let Some(timer) = due else { break };
            tracing::trace!(task = timer.id.0, "timer fired");
            (timer.task)();
            fired += 1;
        }
        let mut inner = self.inner.borrow_mut();
        inner.now = inner.now.max(target);
        fired
    }

    /// Advance the virtual clock to a wall-clock instant.
    ///
    /// The first call anchors virtual time zero to `now`.
    pub fn tick(&self, now: Instant) -> usize {
        let elapsed = {
            let mut inner = self.inner.borrow_mut();
            let origin = *inner.origin.get_or_insert(now);
            now.saturating_duration_since(origin)
        };
        let current = self.now();
        self.advance(elapsed.saturating_sub(current))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn recorder() -> (Rc<RefCell<Vec<&'static str>>>, Scheduler) {
        (Rc::new(RefCell::new(Vec::new())), Scheduler::new())
    }

    #[test]
    fn frame_callbacks_wait_for_run_frame() {
        let (log, s) = recorder();
        let l = Rc::clone(&log);
        s.request_frame(move || l.borrow_mut().push("frame"));
        assert!(log.borrow().is_empty());
        assert_eq!(s.run_frame(), 1);
        assert_eq!(*log.borrow(), vec!["frame"]);
        assert_eq!(s.run_frame(), 0);
    }

    #[test]
    fn frame_queued_during_frame_runs_next_frame() {
        let s = Scheduler::new();
        let hits = Rc::new(Cell::new(0));
        let (s2, h) = (s.clone(), Rc::clone(&hits));
        s.request_frame(move || {
            h.set(h.get() + 1);
            let h2 = Rc::clone(&h);
            s2.request_frame(move || h2.set(h2.get() + 10));
        });
        s.run_frame();
        assert_eq!(hits.get(), 1);
        s.run_frame();
        assert_eq!(hits.get(), 11);
    }

    #[test]
    fn timers_fire_in_deadline_order() {
        let (log, s) = recorder();
        let (a, b) = (Rc::clone(&log), Rc::clone(&log));
        s.set_timeout(Duration::from_millis(300), move || a.borrow_mut().push("late"));
        s.set_timeout(Duration::from_millis(100), move || b.borrow_mut().push("early"));

        assert_eq!(s.advance(Duration::from_millis(99)), 0);
        assert_eq!(s.advance(Duration::from_millis(1)), 1);
        assert_eq!(s.now(), Duration::from_millis(100));
        assert_eq!(s.advance(Duration::from_secs(1)), 1);
        assert_eq!(*log.borrow(), vec!["early", "late"]);
        assert_eq!(s.now(), Duration::from_millis(1100));
    }

    #[test]
    fn cancel_prevents_run() {
        let s = Scheduler::new();
        let hit = Rc::new(Cell::new(false));
        let h = Rc::clone(&hit);
        let id = s.set_timeout(Duration::from_millis(10), move || h.set(true));
        assert!(s.is_pending(id));
        assert!(s.cancel(id));
        assert!(!s.cancel(id));
        s.advance(Duration::from_secs(1));
        assert!(!hit.get());
    }

    #[test]
    fn timer_can_schedule_within_window() {
        let s = Scheduler::new();
        let hits = Rc::new(Cell::new(0));
        let (s2, h) = (s.clone(), Rc::clone(&hits));
        s.set_timeout(Duration::from_millis(10), move || {
            h.set(h.get() + 1);
            let h2 = Rc::clone(&h);
            s2.set_timeout(Duration::from_millis(10), move || h2.set(h2.get() + 1));
        });
        assert_eq!(s.advance(Duration::from_millis(25)), 2);
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn tick_anchors_to_first_instant() {
        let s = Scheduler::new();
        let start = Instant::now();
        let hit = Rc::new(Cell::new(false));
        let h = Rc::clone(&hit);
        s.tick(start);
        s.set_timeout(Duration::from_millis(50), move || h.set(true));
        s.tick(start + Duration::from_millis(49));
        assert!(!hit.get());
        s.tick(start + Duration::from_millis(50));
        assert!(hit.get());
    }

    proptest::proptest! {
        #[test]
        fn timers_fire_sorted_by_deadline_then_schedule_order(
            delays in proptest::collection::vec(0u64..500, 1..24),
            steps in proptest::collection::vec(1u64..200, 1..8),
        ) {
            let s = Scheduler::new();
            let log = Rc::new(RefCell::new(Vec::new()));
            for (i, d) in delays.iter().enumerate() {
                let l = Rc::clone(&log);
                s.set_timeout(Duration::from_millis(*d), move || l.borrow_mut().push(i));
            }
            for step in steps {
                s.advance(Duration::from_millis(step));
            }
            s.advance(Duration::from_millis(500));

            let mut expected: Vec<usize> = (0..delays.len()).collect();
            expected.sort_by_key(|&i| delays[i]);
            proptest::prop_assert_eq!(&*log.borrow(), &expected);
            proptest::prop_assert_eq!(s.pending_timers(), 0);
        }
    }
}
