//! Builds the webpmux argument list
use crate::animation::{Argb, Frame};
use crate::compose::{blend_flag, dispose_ordinal, BlendFlag};
use crate::error::CatResult;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// A frame translated to what WebP can store
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuantizedFrame {
    pub encoded: PathBuf,
    pub delay_ms: u16,
    pub x: u32,
    pub y: u32,
    pub dispose: u32,
    pub blend: BlendFlag,
}

impl QuantizedFrame {
    /// `index` is only used to say which frame couldn't be translated
    pub fn new(index: usize, frame: &Frame, encoded: PathBuf) -> CatResult<Self> {
        let translate = || -> CatResult<Self> {
            Ok(Self {
                delay_ms: frame.delay.to_millis()?,
                x: frame.x,
                y: frame.y,
                dispose: dispose_ordinal(frame.dispose)?,
                blend: blend_flag(frame.blend)?,
                encoded,
            })
        };
        translate().map_err(|e| e.in_frame(index))
    }

    /// `+delay+x+y+dispose` followed by `+b` or `-b`
    pub fn directive(&self) -> String {
        format!("+{}+{}+{}+{}{}", self.delay_ms, self.x, self.y, self.dispose, self.blend)
    }
}

/// One webpmux invocation. Arguments are produced in one pass by [`MuxCommand::args`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MuxCommand {
    frames: Vec<QuantizedFrame>,
    loop_count: Option<u16>,
    background: Option<Argb>,
    output: PathBuf,
}

impl MuxCommand {
    pub fn new(frames: Vec<QuantizedFrame>, output: impl Into<PathBuf>) -> Self {
        Self {
            frames,
            loop_count: None,
            background: None,
            output: output.into(),
        }
    }

    /// 0 loops forever
    #[must_use]
    pub fn loop_count(mut self, loop_count: Option<u16>) -> Self {
        self.loop_count = loop_count;
        self
    }

    #[must_use]
    pub fn background(mut self, background: Option<Argb>) -> Self {
        self.background = background;
        self
    }

    #[inline]
    pub fn frames(&self) -> &[QuantizedFrame] {
        &self.frames
    }

    #[inline]
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Order is significant: frames, `-loop`, `-bgcolor`, then `-o`
    pub fn args(&self) -> Vec<OsString> {
        let mut args = Vec::with_capacity(self.frames.len() * 3 + 6);
        for frame in &self.frames {
            args.push("-frame".into());
            args.push(frame.encoded.clone().into_os_string());
            args.push(frame.directive().into());
        }
        if let Some(loop_count) = self.loop_count {
            args.push("-loop".into());
            args.push(loop_count.to_string().into());
        }
        if let Some(background) = self.background {
            args.push("-bgcolor".into());
            args.push(background.to_string().into());
        }
        args.push("-o".into());
        args.push(self.output.clone().into_os_string());
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{BlendOp, Delay, DisposeOp};
    use crate::Error;

    fn frame(n: usize, dispose: u32, blend: u32) -> Frame {
        Frame {
            src: format!("animation{n}.png").into(),
            delay: Delay::new(1, 30),
            x: n as u32,
            y: 2 * n as u32,
            dispose: DisposeOp::from(dispose),
            blend: BlendOp::from(blend),
        }
    }

    fn quantized(ops: &[(u32, u32)]) -> Vec<QuantizedFrame> {
        ops.iter().enumerate().map(|(i, &(d, b))| {
            let f = frame(i + 1, d, b);
            let encoded = PathBuf::from(format!("/w/{}.webp", f.src.display()));
            QuantizedFrame::new(i, &f, encoded).unwrap()
        }).collect()
    }

    fn strings(args: &[OsString]) -> Vec<&str> {
        args.iter().map(|a| a.to_str().unwrap()).collect()
    }

    #[test]
    fn frame_directives_then_output() {
        let cmd = MuxCommand::new(quantized(&[(0, 0), (1, 1)]), "out.webp");
        assert_eq!(strings(&cmd.args()), [
            "-frame", "/w/animation1.png.webp", "+33+1+2+0-b",
            "-frame", "/w/animation2.png.webp", "+33+2+4+1+b",
            "-o", "out.webp",
        ]);
    }

    #[test]
    fn loop_precedes_background() {
        let cmd = MuxCommand::new(quantized(&[(2, 0)]), "out.webp")
            .background(Some(Argb([255, 1, 2, 3])))
            .loop_count(Some(0));
        assert_eq!(strings(&cmd.args())[3..], [
            "-loop", "0", "-bgcolor", "255,1,2,3", "-o", "out.webp",
        ]);

        let only_bg = MuxCommand::new(quantized(&[(0, 0)]), "out.webp").background(Some(Argb([0; 4])));
        assert_eq!(strings(&only_bg.args())[3..], ["-bgcolor", "0,0,0,0", "-o", "out.webp"]);
    }

    #[test]
    fn args_are_deterministic() {
        let cmd = MuxCommand::new(quantized(&[(0, 0), (1, 1), (0, 0)]), "x.webp").loop_count(Some(3));
        let first = cmd.args();
        for _ in 0..5 {
            assert_eq!(cmd.clone().args(), first);
        }
    }

    #[test]
    fn translation_errors_name_the_frame() {
        let err = QuantizedFrame::new(4, &frame(5, 0, 2), "x.webp".into()).unwrap_err();
        assert_eq!(err.frame_index(), Some(4));
        assert!(matches!(err.root(), Error::UnsupportedBlendOperation(2)));

        let mut bad_delay = frame(1, 0, 0);
        bad_delay.delay = Delay::new(1, 0);
        let err = QuantizedFrame::new(0, &bad_delay, "x.webp".into()).unwrap_err();
        assert!(matches!(err.root(), Error::InvalidDelay(1, 0)));
    }
}
