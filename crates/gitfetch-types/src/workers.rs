use std::fmt;
use std::num::NonZeroUsize;

use crate::error::TypeError;

/// Worker pool size used when no configuration exists yet.
pub const DEFAULT_WORKERS: i64 = 8;

/// Largest worker pool a run will start.
pub const MAX_WORKERS: i64 = 1024;

/// A number of concurrent fetch workers in `1..=MAX_WORKERS`.
///
/// The registry stores the raw integer the user configured; converting it into
/// a `WorkerCount` is where an out-of-range value is rejected, so a dispatcher
/// can never be started with an empty or unbounded pool.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorkerCount(NonZeroUsize);

impl WorkerCount {
    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl TryFrom<i64> for WorkerCount {
    type Error = TypeError;

    fn try_from(n: i64) -> Result<Self, Self::Error> {
        if n > MAX_WORKERS {
            return Err(TypeError::TooManyWorkers { requested: n, max: MAX_WORKERS });
        }
        usize::try_from(n)
            .ok()
            .and_then(NonZeroUsize::new)
            .map(Self)
            .ok_or(TypeError::InvalidWorkerCount(n))
    }
}

impl fmt::Display for WorkerCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for WorkerCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WorkerCount({})", self.0)
    }
}
