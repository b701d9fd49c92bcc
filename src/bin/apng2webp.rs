#[macro_use] extern crate clap;

use apng2webp::progress::{NoProgress, ProgressReporter};
use apng2webp::{Argb, Settings};

use clap::{value_parser, Arg, ArgAction, Command};

use std::env;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub type BinResult<T, E = Box<dyn std::error::Error + Send + Sync>> = Result<T, E>;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(e) = bin_main() {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn bin_main() -> BinResult<()> {
    let matches = Command::new(crate_name!())
        .version(crate_version!())
        .about("Converts animated PNG (APNG) files to animated WebP files")
        .arg_required_else_help(true)
        .arg(Arg::new("input")
            .help("APNG file to convert")
            .value_name("anim.png")
            .value_parser(value_parser!(PathBuf))
            .required(true))
        .arg(Arg::new("output")
            .help("Destination file, overwritten if it exists. Defaults to the input with a .webp extension")
            .value_name("anim.webp")
            .value_parser(value_parser!(PathBuf)))
        .arg(Arg::new("loop")
            .long("loop")
            .short('l')
            .help("Number of times the animation plays, 0-65535. 0 loops forever")
            .value_name("N")
            .value_parser(value_parser!(u16)))
        .arg(Arg::new("background-color")
            .long("background-color")
            .visible_alias("bgcolor")
            .help("Background color as an A,R,G,B tuple, e.g. 255,255,255,255")
            .value_name("A,R,G,B")
            .value_parser(|s: &str| s.parse::<Argb>()))
        .arg(Arg::new("workdir")
            .long("workdir")
            .visible_alias("tmpdir")
            .help("Keep intermediate frames and metadata in this directory (created if missing). \
                   By default a temporary directory is used and removed afterwards")
            .value_name("PATH")
            .value_parser(value_parser!(PathBuf)))
        .arg(Arg::new("threads")
            .long("threads")
            .short('j')
            .help("Number of frames to encode in parallel. 0 uses all CPU cores")
            .value_name("N")
            .value_parser(value_parser!(u8))
            .default_value("0"))
        .arg(Arg::new("quiet")
            .long("quiet")
            .short('q')
            .action(ArgAction::SetTrue)
            .help("Do not display anything on standard output/console"))
        .get_matches_from(wild::args_os());

    let input = matches.get_one::<PathBuf>("input").ok_or("Missing input")?;
    let output = matches.get_one::<PathBuf>("output").cloned()
        .unwrap_or_else(|| apng2webp::default_output_path(input));
    let quiet = matches.get_flag("quiet");

    let settings = Settings {
        loop_count: matches.get_one::<u16>("loop").copied(),
        background: matches.get_one::<Argb>("background-color").copied(),
        workdir: matches.get_one::<PathBuf>("workdir").cloned(),
        threads: matches.get_one::<u8>("threads").copied().unwrap_or(0),
        ..Settings::default()
    };

    check_if_path_exists(input)?;

    let mut pb = ProgressBar { bar: None };
    let mut nopb = NoProgress {};
    let progress: &mut dyn ProgressReporter = if quiet { &mut nopb } else { &mut pb };

    let summary = apng2webp::convert(input, &output, settings, progress)?;
    progress.done(&format!("apng2webp created {} ({} frames)", DestPath(&summary.output), summary.frames));

    Ok(())
}

/// The bar is created once the number of frames is known
struct ProgressBar {
    bar: Option<pbr::ProgressBar<io::Stdout>>,
}

impl ProgressReporter for ProgressBar {
    fn set_total(&mut self, frames: u64) {
        let mut pb = pbr::ProgressBar::new(frames);
        pb.show_speed = false;
        pb.show_percent = false;
        pb.format(" #_. ");
        pb.message("Frame ");
        pb.set_max_refresh_rate(Some(Duration::from_millis(250)));
        self.bar = Some(pb);
    }

    fn increase(&mut self) -> bool {
        if let Some(pb) = &mut self.bar {
            pb.inc();
        }
        true
    }

    fn done(&mut self, msg: &str) {
        match &mut self.bar {
            Some(pb) => pb.finish_print(msg),
            None => println!("{msg}"),
        }
    }
}

fn check_if_path_exists(path: &Path) -> BinResult<()> {
    if !path.exists() {
        let mut msg = format!("Unable to find the input file: \"{}\"", path.display());
        if path.is_relative() {
            msg += &format!(" (searched in \"{}\")", env::current_dir()?.display());
        }
        return Err(msg.into());
    }
    Ok(())
}

struct DestPath<'a>(&'a Path);

impl fmt::Display for DestPath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let abs_path = dunce::canonicalize(self.0);
        abs_path.as_ref().map(|p| p.as_path()).unwrap_or(self.0).display().fmt(f)
    }
}
