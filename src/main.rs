//! Command-line front end: convert a MIDI file into a Sp3ctra score.

use std::path::{Path, PathBuf};
use std::process;

use log::LevelFilter;
use sp3ctra_score::{
    canvas_from_bytes, canvas_to_json, render_file, DecodeOptions, Error, Layout, OutputFormat,
    TrackSelection,
};

const USAGE: &str = "\
Generate a Sp3ctra-compatible score (PDF or SVG) from a monophonic MIDI file.

Usage: sp3ctra-score <input.mid> [output] [options]

Arguments:
  input.mid           Input MIDI file
  output              Output file (optional, defaults to <input dir>/../<format>/<name>.<format>)

Options:
  --format <svg|pdf>  Output format (default: from output extension, else pdf)
  --layout <file>     JSON file overriding layout constants
  --all-tracks        Read notes from every track instead of only the first
  --json              Print the laid-out canvas as JSON instead of writing a file
  --log <level>       Logging level (DEBUG, INFO, WARNING, ERROR)
  -h, --help          Show this help
";

#[derive(Debug, Clone, PartialEq)]
struct CliArgs {
    input: PathBuf,
    output: Option<PathBuf>,
    format: Option<OutputFormat>,
    layout: Option<PathBuf>,
    all_tracks: bool,
    json: bool,
    log_level: Option<String>,
}

enum Command {
    Run(CliArgs),
    Help,
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<Command, String> {
    let mut positional = Vec::new();
    let mut format = None;
    let mut layout = None;
    let mut all_tracks = false;
    let mut json = false;
    let mut log_level = None;

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            "--all-tracks" => all_tracks = true,
            "--json" => json = true,
            "--format" | "--layout" | "--log" => {
                let value = iter
                    .next()
                    .ok_or_else(|| format!("{arg} expects a value"))?;
                match arg.as_str() {
                    "--format" => {
                        format = Some(value.parse::<OutputFormat>().map_err(|e| e.to_string())?)
                    }
                    "--layout" => layout = Some(PathBuf::from(value)),
                    _ => log_level = Some(value),
                }
            }
            flag if flag.starts_with("--") => return Err(format!("Unknown option {flag}")),
            _ => positional.push(PathBuf::from(arg)),
        }
    }

    let mut positional = positional.into_iter();
    let input = positional.next().ok_or("Missing input MIDI file")?;
    let output = positional.next();
    if let Some(extra) = positional.next() {
        return Err(format!("Unexpected argument {}", extra.display()));
    }

    Ok(Command::Run(CliArgs {
        input,
        output,
        format,
        layout,
        all_tracks,
        json,
        log_level,
    }))
}

/// Level names are case-insensitive; WARNING and CRITICAL are accepted too.
fn parse_level(name: &str) -> LevelFilter {
    match name.to_ascii_lowercase().as_str() {
        "warning" => LevelFilter::Warn,
        "critical" => LevelFilter::Error,
        other => other.parse().unwrap_or(LevelFilter::Info),
    }
}

/// `<input dir>/../<ext>/<input stem>.<ext>`
fn default_output_path(input: &Path, format: OutputFormat) -> PathBuf {
    let base = input.parent().and_then(Path::parent).unwrap_or(Path::new(""));
    let name = input.with_extension(format.extension());
    let file_name = name.file_name().unwrap_or(name.as_os_str());
    base.join(format.extension()).join(file_name)
}

fn resolve_format(args: &CliArgs) -> OutputFormat {
    args.format
        .or_else(|| {
            args.output
                .as_deref()
                .and_then(Path::extension)
                .and_then(|e| e.to_str())
                .and_then(OutputFormat::from_extension)
        })
        .unwrap_or(OutputFormat::Pdf)
}

fn init_logging(level: Option<&str>) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(level) = level {
        builder.filter_level(parse_level(level));
    }
    builder.format_timestamp(None).format_target(false).init();
}

fn run(args: CliArgs) -> Result<(), Error> {
    let layout = match &args.layout {
        Some(path) => Layout::from_file(path)?,
        None => Layout::default(),
    };
    let options = DecodeOptions {
        tracks: if args.all_tracks {
            TrackSelection::All
        } else {
            TrackSelection::First
        },
    };

    if args.json {
        let data = std::fs::read(&args.input).map_err(|e| Error::Io {
            path: args.input.clone(),
            source: e,
        })?;
        let canvas = canvas_from_bytes(&data, &layout, &options)?;
        println!("{}", canvas_to_json(&canvas)?);
        return Ok(());
    }

    let format = resolve_format(&args);
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.input, format));

    let summary = render_file(&args.input, &output, format, &layout, &options)?;
    log::debug!("{} segments drawn", summary.segments);
    Ok(())
}

fn main() {
    let args = match parse_args(std::env::args().skip(1)) {
        Ok(Command::Run(args)) => args,
        Ok(Command::Help) => {
            print!("{USAGE}");
            return;
        }
        Err(e) => {
            eprintln!("Error: {e}\n\n{USAGE}");
            process::exit(2);
        }
    };

    init_logging(args.log_level.as_deref());

    if let Err(e) = run(args) {
        log::error!("{e}");
        let mut source = std::error::Error::source(&e);
        while let Some(cause) = source {
            log::error!("  caused by: {cause}");
            source = std::error::Error::source(cause);
        }
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Command, String> {
        parse_args(list.iter().map(|s| s.to_string()))
    }

    fn run_args(list: &[&str]) -> CliArgs {
        match args(list) {
            Ok(Command::Run(a)) => a,
            _ => panic!("expected run command for {list:?}"),
        }
    }

    #[test]
    fn positional_and_flags() {
        let a = run_args(&["song.mid", "out.svg", "--all-tracks", "--log", "DEBUG"]);
        assert_eq!(a.input, PathBuf::from("song.mid"));
        assert_eq!(a.output, Some(PathBuf::from("out.svg")));
        assert!(a.all_tracks);
        assert_eq!(a.log_level.as_deref(), Some("DEBUG"));
        assert_eq!(resolve_format(&a), OutputFormat::Svg);
    }

    #[test]
    fn explicit_format_wins_over_extension() {
        let a = run_args(&["song.mid", "out.svg", "--format", "pdf"]);
        assert_eq!(resolve_format(&a), OutputFormat::Pdf);
    }

    #[test]
    fn missing_input_and_bad_flags() {
        assert!(args(&[]).is_err());
        assert!(args(&["--format"]).is_err());
        assert!(args(&["a.mid", "--frobnicate"]).is_err());
        assert!(args(&["a.mid", "b.pdf", "c.pdf"]).is_err());
        assert!(matches!(args(&["--help"]), Ok(Command::Help)));
    }

    #[test]
    fn default_output_goes_to_sibling_folder() {
        assert_eq!(
            default_output_path(Path::new("scores/midi/tune.mid"), OutputFormat::Pdf),
            PathBuf::from("scores/pdf/tune.pdf")
        );
        assert_eq!(
            default_output_path(Path::new("tune.mid"), OutputFormat::Svg),
            PathBuf::from("svg/tune.svg")
        );
    }

    #[test]
    fn level_names() {
        assert_eq!(parse_level("WARNING"), LevelFilter::Warn);
        assert_eq!(parse_level("debug"), LevelFilter::Debug);
        assert_eq!(parse_level("nonsense"), LevelFilter::Info);
    }
}
