//! Frame list and global properties of one decoded APNG

use crate::error::{CatResult, Error};
use serde::Deserialize;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

/// Frame duration in seconds, as a fraction
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Delay {
    pub num: i64,
    pub den: i64,
}

impl Delay {
    #[inline]
    pub fn new(num: i64, den: i64) -> Self {
        Self { num, den }
    }

    /// See [`crate::delay::quantize`]
    #[inline]
    pub fn to_millis(self) -> CatResult<u16> {
        crate::delay::quantize(self.num, self.den)
    }
}

/// What happens to the canvas after the frame has been shown
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DisposeOp {
    None,
    Background,
    Previous,
    /// Not a value APNG defines. Kept so the mapper can reject it with the ordinal.
    Unknown(u32),
}

impl From<u32> for DisposeOp {
    fn from(op: u32) -> Self {
        match op {
            0 => Self::None,
            1 => Self::Background,
            2 => Self::Previous,
            other => Self::Unknown(other),
        }
    }
}

impl DisposeOp {
    pub fn ordinal(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Background => 1,
            Self::Previous => 2,
            Self::Unknown(op) => op,
        }
    }
}

/// Whether the frame's pixels overwrite the canvas region or are composited over it
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BlendOp {
    Source,
    Over,
    Unknown(u32),
}

impl From<u32> for BlendOp {
    fn from(op: u32) -> Self {
        match op {
            0 => Self::Source,
            1 => Self::Over,
            other => Self::Unknown(other),
        }
    }
}

impl BlendOp {
    pub fn ordinal(self) -> u32 {
        match self {
            Self::Source => 0,
            Self::Over => 1,
            Self::Unknown(op) => op,
        }
    }
}

/// One frame of the source animation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    /// Decoded raster, relative to the working directory
    pub src: PathBuf,
    pub delay: Delay,
    pub x: u32,
    pub y: u32,
    pub dispose: DisposeOp,
    pub blend: BlendOp,
}

/// Background color in the A,R,G,B order webpmux takes
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Argb(pub [u8; 4]);

impl fmt::Display for Argb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, r, g, b] = self.0;
        write!(f, "{a},{r},{g},{b}")
    }
}

impl FromStr for Argb {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut out = [0u8; 4];
        let mut parts = s.split(',');
        for channel in &mut out {
            let part = parts.next().ok_or_else(|| format!("'{s}' needs four A,R,G,B values"))?;
            *channel = part.trim().parse().map_err(|_| format!("'{}' is not a 0-255 channel value", part.trim()))?;
        }
        if parts.next().is_some() {
            return Err(format!("'{s}' has more than four A,R,G,B values"));
        }
        Ok(Self(out))
    }
}

/// Ordered, non-empty list of frames. Read-only once loaded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Animation {
    frames: Vec<Frame>,
}

#[derive(Deserialize)]
struct MetadataDoc {
    frames: Vec<FrameDoc>,
}

#[derive(Deserialize)]
struct FrameDoc {
    src: String,
    delay_num: i64,
    delay_den: i64,
    x: u32,
    y: u32,
    dispose_op: u32,
    blend_op: u32,
}

impl Animation {
    /// `None` if there are no frames
    pub fn new(frames: Vec<Frame>) -> Option<Self> {
        if frames.is_empty() {
            return None;
        }
        Some(Self { frames })
    }

    /// Reads the JSON document written by the demuxer
    pub fn load(path: &Path) -> CatResult<Self> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| Error::MetadataParse(path.into(), e.to_string()))?;
        Self::from_json(&json).map_err(|reason| Error::MetadataParse(path.into(), reason))
    }

    fn from_json(json: &str) -> Result<Self, String> {
        let doc: MetadataDoc = serde_json::from_str(json).map_err(|e| e.to_string())?;
        let frames = doc.frames.into_iter().enumerate().map(|(i, f)| -> Result<Frame, String> {
            Ok(Frame {
                src: plain_file_name(&f.src).ok_or_else(|| format!("frame {i} src '{}' is not a plain file name", f.src))?,
                delay: Delay::new(f.delay_num, f.delay_den),
                x: f.x,
                y: f.y,
                dispose: f.dispose_op.into(),
                blend: f.blend_op.into(),
            })
        }).collect::<Result<Vec<_>, _>>()?;
        Self::new(frames).ok_or_else(|| "animation has no frames".to_string())
    }

    #[inline]
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Frame files must stay inside the working directory
fn plain_file_name(src: &str) -> Option<PathBuf> {
    let path = Path::new(src);
    let mut components = path.components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Some(path.into()),
        _ => None,
    }
}
