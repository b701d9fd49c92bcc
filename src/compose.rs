//! Maps APNG dispose/blend operations onto what webpmux can express

use crate::animation::{BlendOp, DisposeOp};
use crate::error::{CatResult, Error};
use std::fmt;

/// WebP has a binary blending flag per frame
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BlendFlag {
    /// Frame pixels overwrite the canvas region (`-b`)
    Replace,
    /// Frame is alpha-blended over the canvas (`+b`)
    Blend,
}

impl fmt::Display for BlendFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Replace => "-b",
            Self::Blend => "+b",
        })
    }
}

pub fn blend_flag(op: BlendOp) -> CatResult<BlendFlag> {
    match op {
        BlendOp::Source => Ok(BlendFlag::Replace),
        BlendOp::Over => Ok(BlendFlag::Blend),
        BlendOp::Unknown(op) => Err(Error::UnsupportedBlendOperation(op)),
    }
}

/// Dispose ordinals are passed to webpmux verbatim
pub fn dispose_ordinal(op: DisposeOp) -> CatResult<u32> {
    match op {
        DisposeOp::Unknown(op) => Err(Error::UnsupportedDisposeOperation(op)),
        known => Ok(known.ordinal()),
    }
}
