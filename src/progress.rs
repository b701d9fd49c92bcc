//! For tracking conversion progress and aborting early

/// A trait that is used to report progress to some consumer.
pub trait ProgressReporter: Send {
    /// Called once the number of frames to encode is known
    fn set_total(&mut self, _frames: u64) {}

    /// Called after each frame has been encoded. Frames may finish in any order.
    ///
    /// This method may return `false` to abort processing.
    fn increase(&mut self) -> bool;

    /// Called when the output file has been written
    fn done(&mut self, _msg: &str) {}
}

/// No-op progress reporter
pub struct NoProgress {}

impl ProgressReporter for NoProgress {
    fn increase(&mut self) -> bool {
        true
    }
}
