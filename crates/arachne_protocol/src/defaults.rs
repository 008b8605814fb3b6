//! Canonical default values shared across the coordination plane.

/// Poll interval for adapters bridging a poll-based bus backend.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// How long the bus must stay empty before a job is considered done.
pub const DEFAULT_IDLE_GRACE_MS: u64 = 3_000;

/// Capacity of in-process channels and the in-memory bus queues.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

pub const SCHEDULED_TASKS_QUEUE: &str = "scheduledTasks";
pub const TASK_PROMISES_QUEUE: &str = "taskPromises";
pub const ITEMS_QUEUE: &str = "items";
