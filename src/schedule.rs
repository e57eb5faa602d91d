//! Deferred, cancelable tasks on the game clock
//!
//! Level advances, feedback clears and revives fire a short delay after the
//! event that requested them. Time only moves when the host calls `advance`,
//! so tests drive the clock directly.

/// Identifies one scheduled task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

#[derive(Debug, Clone)]
struct Pending<T> {
    handle: TaskHandle,
    /// Absolute clock time in seconds
    due: f64,
    task: T,
}

/// Pending tasks keyed by due time
#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    now: f64,
    next_id: u64,
    pending: Vec<Pending<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            now: 0.0,
            next_id: 1,
            pending: Vec::new(),
        }
    }

    /// Current clock in seconds
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Run `task` after `delay` seconds
    pub fn schedule(&mut self, delay: f32, task: T) -> TaskHandle {
        let handle = TaskHandle(self.next_id);
        self.next_id += 1;
        self.pending.push(Pending {
            handle,
            due: self.now + f64::from(delay.max(0.0)),
            task,
        });
        handle
    }

    /// Cancel whatever `slot` holds and schedule `task` in its place
    pub fn supersede(&mut self, slot: &mut Option<TaskHandle>, delay: f32, task: T) -> TaskHandle {
        if let Some(old) = slot.take() {
            if self.cancel(old) {
                log::debug!("Superseded pending task {old:?}");
            }
        }
        let handle = self.schedule(delay, task);
        *slot = Some(handle);
        handle
    }

    /// Drop a pending task. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.handle != handle);
        self.pending.len() != before
    }

    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.pending.iter().any(|p| p.handle == handle)
    }

    /// Move the clock forward and return every task now due, earliest first
    pub fn advance(&mut self, dt: f32) -> Vec<(TaskHandle, T)> {
        self.now += f64::from(dt);
        let now = self.now;

        let mut due = Vec::new();
        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i].due <= now {
                due.push(self.pending.remove(i));
            } else {
                i += 1;
            }
        }
        // Stable: equal due times keep scheduling order
        due.sort_by(|a, b| a.due.total_cmp(&b.due));
        due.into_iter().map(|p| (p.handle, p.task)).collect()
    }

    /// Cancel everything
    pub fn clear(&mut self) {
        if !self.pending.is_empty() {
            log::debug!("Cleared {} pending tasks", self.pending.len());
        }
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
