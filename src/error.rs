use crate::pipeline::Stage;
use crate::process::Tool;
use std::io;
use std::path::PathBuf;
use quick_error::quick_error;

quick_error! {
    /// Why an external program did not deliver
    #[derive(Debug)]
    pub enum ToolFailure {
        Spawn(err: io::Error) {
            display("could not be started: {}", err)
            source(err)
        }
        Status(code: Option<i32>, stderr: String) {
            display("exited with {}{}", match code {
                Some(code) => format!("status {code}"),
                None => "a signal".to_string(),
            }, if stderr.is_empty() { String::new() } else { format!(": {stderr}") })
        }
        /// Reported success, but the file it should have written isn't there
        MissingOutput(path: PathBuf) {
            display("reported success but did not write {}", path.display())
        }
    }
}

quick_error! {
    #[derive(Debug)]
    pub enum Error {
        InvalidDelay(num: i64, den: i64) {
            display("frame delay {}/{} s can't be stored as 10-65535 ms", num, den)
        }
        UnsupportedBlendOperation(op: u32) {
            display("WebP can't represent APNG blend operation {}", op)
        }
        UnsupportedDisposeOperation(op: u32) {
            display("WebP can't represent APNG dispose operation {}", op)
        }
        MetadataParse(path: PathBuf, reason: String) {
            display("bad animation metadata in {}: {}", path.display(), reason)
        }
        ExternalTool(tool: Tool, failure: ToolFailure) {
            display("{} {}", tool, failure)
            source(failure)
        }
        Io(path: PathBuf, operation: &'static str, err: io::Error) {
            display("can't {} {}: {}", operation, path.display(), err)
            source(err)
        }
        /// Failure specific to one frame. Index is 0-based, in playback order
        Frame { index: usize, cause: Box<Error> } {
            display("frame {}: {}", index, cause)
            source(&**cause)
        }
        /// Added by the pipeline around anything that went wrong during a stage
        Failed { stage: Stage, cause: Box<Error> } {
            display("{} failed: {}", stage, cause)
            source(&**cause)
        }
        /// Internal error
        ThreadSend {
            display("Internal error; unexpectedly aborted")
        }
        Aborted {
            display("aborted")
        }
    }
}

pub type CatResult<T, E = Error> = Result<T, E>;

impl Error {
    #[cold]
    pub(crate) fn io(path: impl Into<PathBuf>, operation: &'static str, err: io::Error) -> Self {
        Self::Io(path.into(), operation, err)
    }

    #[cold]
    pub(crate) fn in_frame(self, index: usize) -> Self {
        Self::Frame { index, cause: Box::new(self) }
    }

    #[cold]
    pub(crate) fn in_stage(self, stage: Stage) -> Self {
        Self::Failed { stage, cause: Box::new(self) }
    }

    /// Pipeline stage that was running when this error happened
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Failed { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Index of the frame this error is about, if any
    pub fn frame_index(&self) -> Option<usize> {
        match self {
            Self::Frame { index, .. } => Some(*index),
            Self::Failed { cause, .. } => cause.frame_index(),
            _ => None,
        }
    }

    /// The innermost error, with stage and frame context peeled off
    pub fn root(&self) -> &Self {
        match self {
            Self::Frame { cause, .. } | Self::Failed { cause, .. } => cause.root(),
            other => other,
        }
    }
}

impl<T> From<crossbeam_channel::SendError<T>> for Error {
    #[cold]
    fn from(_: crossbeam_channel::SendError<T>) -> Self {
        Self::ThreadSend
    }
}

impl From<crossbeam_channel::RecvError> for Error {
    #[cold]
    fn from(_: crossbeam_channel::RecvError) -> Self {
        Self::Aborted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_is_reachable_through_wrappers() {
        let err = Error::UnsupportedBlendOperation(2).in_frame(1).in_stage(Stage::Muxing);
        assert_eq!(err.stage(), Some(Stage::Muxing));
        assert_eq!(err.frame_index(), Some(1));
        assert!(matches!(err.root(), Error::UnsupportedBlendOperation(2)));
        assert_eq!(err.to_string(), "muxing failed: frame 1: WebP can't represent APNG blend operation 2");
    }

    #[test]
    fn status_failure_includes_stderr() {
        let err = Error::ExternalTool(Tool::Encoder, ToolFailure::Status(Some(2), "cannot open".into()));
        assert_eq!(err.to_string(), "cwebp exited with status 2: cannot open");
    }
}
