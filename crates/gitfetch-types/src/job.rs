use std::fmt;

use serde::{Deserialize, Serialize};

/// Position of a fetch job within one dispatch run.
///
/// Outcomes are keyed by `JobId` rather than by path so that a path listed
/// twice still produces two distinct outcomes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobId(usize);

impl JobId {
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job#{}", self.0)
    }
}

impl fmt::Debug for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JobId({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_index() {
        let id = JobId::new(3);
        assert_eq!(id.index(), 3);
        assert_eq!(id.to_string(), "job#3");
    }

    #[test]
    fn ordering_follows_index() {
        assert!(JobId::new(1) < JobId::new(2));
    }
}
