//! Optimize → demux → encode frames → mux
//!
//! None of the external tools are trusted to report failure. The optimizer in particular
//! exits with 0 even when it can't read or write files, so after every tool the file it
//! was supposed to produce is checked instead.

use crate::animation::{Animation, Frame};
use crate::error::{CatResult, Error, ToolFailure};
use crate::minipool;
use crate::mux::{MuxCommand, QuantizedFrame};
use crate::process::{CommandLine, ProcessRunner, Tool};
use crate::progress::ProgressReporter;
use crate::workdir::WorkDir;
use crate::Settings;
use std::ffi::OsString;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock, PoisonError};

const NORMALIZED_FILE: &str = "de-optimised.png";
const DEMUX_BASENAME: &str = "animation";

/// Where a conversion is. `Failed` is reachable from every state but `Done`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    Init,
    Optimizing,
    Demuxing,
    MetadataLoaded,
    EncodingFrames,
    Muxing,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Init => "preparing work directory",
            Self::Optimizing => "optimizing",
            Self::Demuxing => "demuxing",
            Self::MetadataLoaded => "loading metadata",
            Self::EncodingFrames => "encoding frames",
            Self::Muxing => "muxing",
            Self::Done => "done",
            Self::Failed => "failed",
        })
    }
}

/// Result of a successful conversion
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Summary {
    pub frames: usize,
    /// Sum of all frame delays after quantization
    pub total_delay_ms: u64,
    pub output: PathBuf,
}

/// Runs one APNG → WebP conversion at a time
pub struct Converter<'r> {
    settings: Settings,
    runner: &'r dyn ProcessRunner,
    state: Stage,
}

impl<'r> Converter<'r> {
    pub fn new(settings: Settings, runner: &'r dyn ProcessRunner) -> Self {
        Self { settings, runner, state: Stage::Init }
    }

    #[inline]
    pub fn state(&self) -> Stage {
        self.state
    }

    #[inline]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Converts `input` and writes `output`, overwriting it.
    ///
    /// Errors are wrapped in [`Error::Failed`] naming the stage that failed.
    /// The work directory is removed afterwards whether or not this succeeds,
    /// unless it was given in [`Settings::workdir`].
    pub fn run(&mut self, input: &Path, output: &Path, reporter: &mut dyn ProgressReporter) -> CatResult<Summary> {
        self.state = Stage::Init;
        let workdir = self.step(Stage::Init, |this| WorkDir::acquire(this.settings.workdir.as_deref()))?;
        log::debug!("work directory {}", workdir.path().display());

        let res = self.run_in(workdir.path(), input, output, reporter);

        if let Err(e) = workdir.close() {
            log::warn!("{e}");
        }
        res
    }

    fn run_in(&mut self, dir: &Path, input: &Path, output: &Path, reporter: &mut dyn ProgressReporter) -> CatResult<Summary> {
        let normalized = dir.join(NORMALIZED_FILE);
        self.step(Stage::Optimizing, |this| {
            this.run_tool(Tool::Optimizer, vec![input.into(), normalized.clone().into()], Some(&normalized))
        })?;

        let metadata = dir.join(format!("{DEMUX_BASENAME}_metadata.json"));
        self.step(Stage::Demuxing, |this| {
            remove_stale(&metadata)?;
            // a missing metadata file is reported when it's loaded
            this.run_tool(Tool::Demuxer, vec![normalized.clone().into(), DEMUX_BASENAME.into()], None)
        })?;

        let animation = self.step(Stage::MetadataLoaded, |_| Animation::load(&metadata))?;
        log::info!("{} frames", animation.len());
        reporter.set_total(animation.len() as u64);

        let encoded = self.step(Stage::EncodingFrames, |this| this.encode_frames(dir, &animation, reporter))?;

        let summary = self.step(Stage::Muxing, |this| this.mux(&animation, encoded, output))?;
        self.state = Stage::Done;
        log::info!("wrote {} ({} frames, {} ms)", output.display(), summary.frames, summary.total_delay_ms);
        Ok(summary)
    }

    /// Enters `stage`, and on failure moves to `Failed` with the stage noted in the error
    fn step<T>(&mut self, stage: Stage, f: impl FnOnce(&Self) -> CatResult<T>) -> CatResult<T> {
        log::info!("{stage}");
        self.state = stage;
        f(self).map_err(|e| {
            self.state = Stage::Failed;
            e.in_stage(stage)
        })
    }

    /// Runs `tool` and checks that it exited with 0 and produced `expected`
    fn run_tool(&self, tool: Tool, args: Vec<OsString>, expected: Option<&Path>) -> CatResult<()> {
        if let Some(expected) = expected {
            remove_stale(expected)?;
        }
        let program = self.settings.tools.program(tool);
        log::debug!("{}", CommandLine(program, &args));
        let out = self.runner.run(program, &args)
            .map_err(|e| Error::ExternalTool(tool, ToolFailure::Spawn(e)))?;
        if !out.success() {
            let stderr = String::from_utf8_lossy(&out.stderr).trim().to_string();
            return Err(Error::ExternalTool(tool, ToolFailure::Status(out.code, stderr)));
        }
        if let Some(expected) = expected {
            if !expected.is_file() {
                return Err(Error::ExternalTool(tool, ToolFailure::MissingOutput(expected.into())));
            }
        }
        Ok(())
    }

    /// Frames are independent, so they're encoded in parallel. The first failure stops the rest.
    fn encode_frames(&self, dir: &Path, animation: &Animation, reporter: &mut dyn ProgressReporter) -> CatResult<Vec<PathBuf>> {
        let frames = animation.frames();
        let slots: Vec<OnceLock<PathBuf>> = frames.iter().map(|_| OnceLock::new()).collect();
        let reporter = Mutex::new(reporter);

        minipool::new(self.num_threads(frames.len()), "encode", |to_workers| {
            for (index, frame) in frames.iter().enumerate() {
                to_workers.send((index, frame))?;
            }
            Ok(())
        }, |(index, frame): (usize, &Frame)| {
            let src = dir.join(&frame.src);
            let mut dst = src.clone().into_os_string();
            dst.push(".webp");
            let dst = PathBuf::from(dst);
            let args: Vec<OsString> = vec!["-lossless".into(), "-q".into(), "100".into(), src.into(), "-o".into(), dst.clone().into()];
            self.run_tool(Tool::Encoder, args, Some(&dst)).map_err(|e| e.in_frame(index))?;

            slots[index].set(dst).map_err(|_| Error::ThreadSend)?;
            if !reporter.lock().unwrap_or_else(PoisonError::into_inner).increase() {
                return Err(Error::Aborted);
            }
            Ok(())
        })?;

        slots.into_iter().map(|slot| slot.into_inner().ok_or(Error::ThreadSend)).collect()
    }

    fn mux(&self, animation: &Animation, encoded: Vec<PathBuf>, output: &Path) -> CatResult<Summary> {
        let frames = animation.frames().iter().zip(encoded).enumerate()
            .map(|(index, (frame, encoded))| QuantizedFrame::new(index, frame, encoded))
            .collect::<CatResult<Vec<_>>>()?;
        let total_delay_ms = frames.iter().map(|f| u64::from(f.delay_ms)).sum();

        let cmd = MuxCommand::new(frames, output)
            .loop_count(self.settings.loop_count)
            .background(self.settings.background);
        self.run_tool(Tool::Muxer, cmd.args(), Some(output))?;

        Ok(Summary {
            frames: cmd.frames().len(),
            total_delay_ms,
            output: output.into(),
        })
    }

    fn num_threads(&self, frames: usize) -> u8 {
        let wanted = match self.settings.threads {
            0 => std::thread::available_parallelism().map_or(1, |n| n.get()),
            n => n.into(),
        };
        wanted.min(frames).clamp(1, u8::MAX.into()) as u8
    }
}

/// So that an old file can't pass for a tool's output
fn remove_stale(path: &Path) -> CatResult<()> {
    match std::fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(Error::io(path, "remove stale", e)),
        _ => Ok(()),
    }
}
