/*
 apng2webp APNG to animated WebP converter

 This program is free software: you can redistribute it and/or modify
 it under the terms of the GNU Affero General Public License as
 published by the Free Software Foundation, either version 3 of the
 License, or (at your option) any later version.

 This program is distributed in the hope that it will be useful,
 but WITHOUT ANY WARRANTY; without even the implied warranty of
 MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 GNU Affero General Public License for more details.

 You should have received a copy of the GNU Affero General Public License
 along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/
//! Converts animated PNG files to animated WebP files.
//!
//! Pixels are handled by external programs (`apng2webp_apngopt`, `apngdisraw`, `cwebp` and `webpmux`).
//! This crate translates the APNG frame timing and compositing into what WebP can express,
//! and refuses to convert when that isn't possible.

mod error;
pub use crate::error::*;
pub mod animation;
pub use crate::animation::{Animation, Argb, BlendOp, Delay, DisposeOp, Frame};
pub mod compose;
pub mod delay;
mod minipool;
pub mod mux;
pub use crate::mux::{MuxCommand, QuantizedFrame};
pub mod pipeline;
pub use crate::pipeline::{Converter, Stage, Summary};
pub mod process;
pub use crate::process::{ProcessOutput, ProcessRunner, SystemRunner, Tool, Toolchain};
pub mod progress;
use crate::progress::ProgressReporter;
pub mod workdir;

use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Settings {
    /// Times the animation plays. 0 loops forever. Left to webpmux if `None`
    pub loop_count: Option<u16>,
    /// Canvas background. Left to webpmux if `None`
    pub background: Option<Argb>,
    /// Keep intermediate files here instead of a temporary directory that is deleted afterwards
    pub workdir: Option<PathBuf>,
    /// Frames encoded in parallel. 0 means one per CPU core
    pub threads: u8,
    pub tools: Toolchain,
}

/// Convert `input` APNG to an animated WebP at `output`, running the real external tools.
///
/// `ProgressReporter.increase()` is called each time a frame has been encoded.
pub fn convert(input: &Path, output: &Path, settings: Settings, reporter: &mut dyn ProgressReporter) -> CatResult<Summary> {
    Converter::new(settings, &SystemRunner).run(input, output, reporter)
}

/// `anim.png` becomes `anim.webp`, anything else gets `.webp` appended
pub fn default_output_path(input: &Path) -> PathBuf {
    let is_png = input.extension().map_or(false, |ext| ext.eq_ignore_ascii_case("png"));
    if is_png {
        input.with_extension("webp")
    } else {
        let mut path = input.as_os_str().to_owned();
        path.push(".webp");
        path.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_path_from_input() {
        assert_eq!(default_output_path(Path::new("a/anim.png")), Path::new("a/anim.webp"));
        assert_eq!(default_output_path(Path::new("ANIM.PNG")), Path::new("ANIM.webp"));
        assert_eq!(default_output_path(Path::new("anim.apng")), Path::new("anim.apng.webp"));
        assert_eq!(default_output_path(Path::new("anim")), Path::new("anim.webp"));
    }
}
