//! Running the external programs that do the actual pixel work

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::io;
use std::process::{Command, Stdio};

/// The external collaborators, in the order the pipeline needs them
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Tool {
    /// Rewrites the APNG using only optimizations WebP can represent
    Optimizer,
    /// Splits the APNG into per-frame PNGs and a JSON metadata document
    Demuxer,
    /// Losslessly encodes one PNG frame as WebP
    Encoder,
    /// Assembles encoded frames into an animated WebP
    Muxer,
}

impl Tool {
    pub fn default_program(self) -> &'static str {
        match self {
            Self::Optimizer => "apng2webp_apngopt",
            Self::Demuxer => "apngdisraw",
            Self::Encoder => "cwebp",
            Self::Muxer => "webpmux",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.default_program())
    }
}

/// Program names (or paths) to run for each tool
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Toolchain {
    pub optimizer: OsString,
    pub demuxer: OsString,
    pub encoder: OsString,
    pub muxer: OsString,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            optimizer: Tool::Optimizer.default_program().into(),
            demuxer: Tool::Demuxer.default_program().into(),
            encoder: Tool::Encoder.default_program().into(),
            muxer: Tool::Muxer.default_program().into(),
        }
    }
}

impl Toolchain {
    pub fn program(&self, tool: Tool) -> &OsStr {
        match tool {
            Tool::Optimizer => &self.optimizer,
            Tool::Demuxer => &self.demuxer,
            Tool::Encoder => &self.encoder,
            Tool::Muxer => &self.muxer,
        }
    }
}

/// What a finished process left behind
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// `None` if it was killed by a signal
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ProcessOutput {
    /// Exit code 0 with no output
    pub fn ok() -> Self {
        Self { code: Some(0), ..Self::default() }
    }

    pub fn failed(code: i32, stderr: impl Into<Vec<u8>>) -> Self {
        Self { code: Some(code), stdout: Vec::new(), stderr: stderr.into() }
    }

    #[inline]
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs a program to completion.
///
/// Frame encodes call this from several threads at once.
/// Tests substitute a scripted implementation, so no codec binaries are needed to exercise the pipeline.
pub trait ProcessRunner: Send + Sync {
    fn run(&self, program: &OsStr, args: &[OsString]) -> io::Result<ProcessOutput>;
}

/// Spawns real processes
#[derive(Copy, Clone, Debug, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, program: &OsStr, args: &[OsString]) -> io::Result<ProcessOutput> {
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()?;
        Ok(ProcessOutput {
            code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

/// For logging
pub(crate) struct CommandLine<'a>(pub &'a OsStr, pub &'a [OsString]);

impl fmt::Display for CommandLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())?;
        for arg in self.1 {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_toolchain_uses_standard_names() {
        let tools = Toolchain::default();
        assert_eq!(tools.program(Tool::Optimizer), "apng2webp_apngopt");
        assert_eq!(tools.program(Tool::Demuxer), "apngdisraw");
        assert_eq!(tools.program(Tool::Encoder), "cwebp");
        assert_eq!(tools.program(Tool::Muxer), "webpmux");
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let res = SystemRunner.run(OsStr::new("apng2webp-no-such-program"), &[]);
        assert!(res.is_err());
    }

    #[test]
    fn command_line_display() {
        let args = [OsString::from("-o"), OsString::from("out.webp")];
        assert_eq!(CommandLine(OsStr::new("webpmux"), &args).to_string(), "webpmux -o out.webp");
    }
}
