//! Command line front end: compile a path expression or a selector envelope
//! and print the resulting selector document as JSON.
#![allow(clippy::multiple_crate_versions)]

use std::error::Error;
use std::process::ExitCode;

use facet::Facet;
use log::debug;
use selpath::{build, envelope, BuildOptions, SegmentMode};

/// selpath: compile textual paths into tree selectors.
#[derive(Facet)]
struct Args {
    /// A path expression such as `a/42/b`, or envelope JSON with `--json`.
    #[facet(positional)]
    input: String,

    /// Treat the input as a `{"selector": ...}` envelope.
    #[facet(named, default)]
    json: bool,

    /// Treat digit-only segments as map keys rather than list indices.
    #[facet(named, default)]
    field_only: bool,

    /// Match every node along the path, not only the target.
    #[facet(named, default)]
    match_path: bool,

    /// JSON file holding build options.
    #[facet(named, default)]
    config: Option<String>,
}

fn options(args: &Args) -> Result<BuildOptions, Box<dyn Error>> {
    let mut options = match &args.config {
        Some(path) => BuildOptions::from_file(path)?,
        None => BuildOptions::default(),
    };
    if args.field_only {
        options.mode = SegmentMode::FieldOnly;
    }
    if args.match_path {
        options.match_intermediate = true;
    }
    Ok(options)
}

fn run(args: &Args) -> Result<String, Box<dyn Error>> {
    if args.json {
        let spec = envelope::from_json(&args.input)?;
        return Ok(spec.to_json());
    }

    let options = options(args)?;
    debug!("building '{}' with {options:?}", args.input);
    let spec = build(&args.input, &options, None)?;
    Ok(spec.to_json())
}

fn main() -> ExitCode {
    env_logger::init();

    let args: Args = match facet_args::from_std_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    };

    match run(&args) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
