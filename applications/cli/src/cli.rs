/// Command-line arguments
use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;

const AFTER_HELP: &str = "\
Each PATH may be a file or a folder. Folders are not searched recursively.
When no PATH is given, the current directory is used.

Files are rewritten in place. Run with --dry-run first to see what would change.";

/// Single-dash long flags accepted for compatibility (`-ampl=1400`, `-proc 4`)
const LEGACY_FLAGS: &[&str] = &["ampl", "proc"];

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "normalize", version)]
#[command(about = "Normalize the loudness of audio files in place")]
#[command(after_help = AFTER_HELP)]
pub struct Cli {
    /// Target amplitude. Increase this value to make songs louder
    #[arg(long = "ampl", value_name = "INT")]
    pub amplitude: Option<u32>,

    /// Number of files to process in parallel
    #[arg(long = "proc", value_name = "INT", allow_negative_numbers = true)]
    pub workers: Option<i64>,

    /// Leave files alone when their scale is within 1 +/- this value
    #[arg(long, value_name = "FLOAT")]
    pub tolerance: Option<f64>,

    /// FFmpeg executable
    #[arg(long = "ffmpeg", value_name = "PATH")]
    pub ffmpeg_path: Option<PathBuf>,

    /// Kill FFmpeg after this many seconds (0 disables the limit)
    #[arg(long = "timeout", value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// Configuration file path (defaults to ./normalize.toml when present)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log what each job does
    #[arg(short, long)]
    pub verbose: bool,

    /// List the files that would be normalized and exit
    #[arg(long)]
    pub dry_run: bool,

    /// Files or folders to normalize
    #[arg(value_name = "PATH")]
    pub paths: Vec<PathBuf>,
}

impl Cli {
    /// Parse `std::env::args_os()`, accepting single-dash legacy flags
    pub fn parse_args() -> Self {
        Self::parse_from(expand_legacy_flags(std::env::args_os()))
    }
}

/// Rewrite `-ampl`/`-proc` (with or without `=value`) to their `--` forms
///
/// Arguments after a bare `--` are left untouched so paths such as
/// `-proc.mp3` can still be passed.
pub fn expand_legacy_flags<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut expanded = Vec::new();
    let mut passthrough = false;

    for arg in args {
        if passthrough {
            expanded.push(arg);
            continue;
        }

        let rewritten = arg.to_str().and_then(|s| {
            if s == "--" {
                return None;
            }
            let flag = s.strip_prefix('-')?;
            if flag.starts_with('-') {
                return None;
            }
            let name = flag.split_once('=').map_or(flag, |(name, _)| name);
            LEGACY_FLAGS
                .contains(&name)
                .then(|| OsString::from(format!("-{}", s)))
        });

        if arg == "--" {
            passthrough = true;
        }
        expanded.push(rewritten.unwrap_or(arg));
    }

    expanded
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<OsString> {
        list.iter().map(OsString::from).collect()
    }

    fn parse(list: &[&str]) -> Cli {
        Cli::try_parse_from(expand_legacy_flags(args(list))).unwrap()
    }

    #[test]
    fn test_expand_legacy_flags() {
        let expanded = expand_legacy_flags(args(&[
            "normalize",
            "-ampl=2000",
            "-proc",
            "4",
            "--tolerance",
            "0.2",
            "-v",
            "song.mp3",
        ]));
        assert_eq!(
            expanded,
            args(&[
                "normalize",
                "--ampl=2000",
                "--proc",
                "4",
                "--tolerance",
                "0.2",
                "-v",
                "song.mp3",
            ])
        );
    }

    #[test]
    fn test_expand_stops_at_double_dash() {
        let expanded = expand_legacy_flags(args(&["normalize", "--", "-ampl=3"]));
        assert_eq!(expanded, args(&["normalize", "--", "-ampl=3"]));
    }

    #[test]
    fn test_parse_legacy_and_long_forms() {
        let cli = parse(&["normalize", "-ampl=2000", "-proc=3", "a.mp3", "music"]);
        assert_eq!(cli.amplitude, Some(2000));
        assert_eq!(cli.workers, Some(3));
        assert_eq!(cli.paths, vec![PathBuf::from("a.mp3"), PathBuf::from("music")]);

        let cli = parse(&["normalize", "--ampl", "900", "--proc", "2"]);
        assert_eq!(cli.amplitude, Some(900));
        assert_eq!(cli.workers, Some(2));
        assert!(cli.paths.is_empty());
    }

    #[test]
    fn test_parse_negative_workers() {
        let cli = parse(&["normalize", "-proc", "-3"]);
        assert_eq!(cli.workers, Some(-3));
    }

    #[test]
    fn test_parse_options() {
        let cli = parse(&[
            "normalize",
            "--ffmpeg",
            "/opt/ffmpeg/bin/ffmpeg",
            "--timeout",
            "0",
            "--config",
            "normalize.toml",
            "--dry-run",
            "--verbose",
        ]);
        assert_eq!(cli.ffmpeg_path, Some(PathBuf::from("/opt/ffmpeg/bin/ffmpeg")));
        assert_eq!(cli.timeout_secs, Some(0));
        assert_eq!(cli.config, Some(PathBuf::from("normalize.toml")));
        assert!(cli.dry_run);
        assert!(cli.verbose);
    }

    #[test]
    fn test_rejects_non_integer_amplitude() {
        let result = Cli::try_parse_from(expand_legacy_flags(args(&["normalize", "-ampl=loud"])));
        assert!(result.is_err());
    }
}
