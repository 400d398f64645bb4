//! Progress reporting for batch transfers.

/// A snapshot of batch transfer progress, published to the observer after
/// every completed task and once more when the batch drains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressUpdate {
    /// True while the queue is draining.
    pub is_uploading: bool,
    /// Completed fraction of the current batch, rounded to whole percent.
    ///
    /// Monotonically non-decreasing within a batch: it depends only on the
    /// completed-task count, which only grows.
    pub percent: u8,
}

impl ProgressUpdate {
    /// Compute the update for `completed` of `total` tasks.
    pub(crate) fn during(completed: usize, total: usize) -> Self {
        debug_assert!(total > 0 && completed <= total);
        let percent = ((completed as f64 / total as f64) * 100.0).round() as u8;
        Self {
            is_uploading: true,
            percent,
        }
    }

    /// The final update published when a batch finishes.
    pub(crate) fn finished() -> Self {
        Self {
            is_uploading: false,
            percent: 100,
        }
    }
}

/// Observer callback for [`ProgressUpdate`]s.
pub type ProgressCallback = Box<dyn Fn(ProgressUpdate) + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_rounds_to_nearest() {
        assert_eq!(ProgressUpdate::during(1, 3).percent, 33);
        assert_eq!(ProgressUpdate::during(2, 3).percent, 67);
        assert_eq!(ProgressUpdate::during(1, 6).percent, 17);
        assert_eq!(ProgressUpdate::during(5, 5).percent, 100);
    }

    #[test]
    fn test_finished_update() {
        let update = ProgressUpdate::finished();
        assert!(!update.is_uploading);
        assert_eq!(update.percent, 100);
    }
}
