//! Command-line arguments for the `courier` binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint};

use crate::page::{PageOrientation, PageSize};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 7071;
/// 10 MiB.
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_SMOKE_URL: &str = "http://localhost:7071";
pub const DEFAULT_SMOKE_OUTPUT: &str = "test_output.pdf";

#[derive(Debug, Parser)]
#[command(name = "courier", version, about = "HTML to PDF conversion service")]
pub struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Defaults to `serve`.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the HTTP conversion service.
    Serve(ServeArgs),
    /// Convert a local HTML file to PDF.
    Convert(ConvertArgs),
    /// POST a sample document to a running service and save the result.
    Smoke(SmokeArgs),
}

#[derive(Debug, Args, Clone, PartialEq, Eq)]
pub struct ServeArgs {
    /// Listener host.
    #[arg(long, env = "COURIER_HOST", default_value = DEFAULT_HOST, value_name = "HOST")]
    pub host: String,

    /// Listener port.
    #[arg(long, env = "COURIER_PORT", default_value_t = DEFAULT_PORT, value_name = "PORT")]
    pub port: u16,

    /// Largest accepted request body.
    #[arg(
        long = "max-body-bytes",
        env = "COURIER_MAX_BODY_BYTES",
        default_value_t = DEFAULT_MAX_BODY_BYTES,
        value_name = "BYTES"
    )]
    pub max_body_bytes: usize,
}

impl Default for ServeArgs {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

/// Parser for running `serve` when no subcommand was given.
#[derive(Debug, Parser)]
#[command(name = "courier")]
struct ImplicitServe {
    #[command(flatten)]
    args: ServeArgs,
}

impl ServeArgs {
    /// Settings from the `COURIER_*` environment variables and defaults.
    pub fn from_env() -> Result<Self, clap::Error> {
        ImplicitServe::try_parse_from(["courier"]).map(|s| s.args)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Args, Clone)]
pub struct ConvertArgs {
    /// HTML file to convert (images must be base64 data URIs; others are skipped).
    #[arg(value_name = "INPUT", value_hint = ValueHint::FilePath)]
    pub input: PathBuf,

    /// Output path (default: same stem as the input with .pdf).
    #[arg(value_name = "OUTPUT", value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Page preset: A4, Letter or Legal. Unknown names fall back to A4.
    #[arg(long = "page-size", default_value = "A4", value_name = "SIZE")]
    pub page_size: String,

    /// Use landscape orientation.
    #[arg(short, long)]
    pub landscape: bool,

    /// Document title when the HTML has no <title> (default: input file stem).
    #[arg(short, long, value_name = "TITLE")]
    pub title: Option<String>,
}

impl ConvertArgs {
    pub fn page_size(&self) -> PageSize {
        PageSize::from_name(&self.page_size)
    }

    pub fn orientation(&self) -> PageOrientation {
        if self.landscape {
            PageOrientation::Landscape
        } else {
            PageOrientation::Portrait
        }
    }

    pub fn output_path(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| {
            let mut o = self.input.clone();
            o.set_extension("pdf");
            o
        })
    }

    pub fn title(&self) -> String {
        self.title.clone().unwrap_or_else(|| {
            self.input
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("converted document")
                .to_string()
        })
    }
}

#[derive(Debug, Args, Clone)]
pub struct SmokeArgs {
    /// Base URL of the running service.
    #[arg(value_name = "BASE_URL", default_value = DEFAULT_SMOKE_URL, value_hint = ValueHint::Url)]
    pub base_url: String,

    /// Where to write the returned PDF.
    #[arg(short, long, default_value = DEFAULT_SMOKE_OUTPUT, value_name = "PATH")]
    pub output: PathBuf,

    /// Request timeout in seconds.
    #[arg(long, default_value_t = 30, value_name = "SECONDS")]
    pub timeout: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["courier"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn serve_defaults() {
        let cli = Cli::try_parse_from(["courier", "serve"]).unwrap();
        let Some(Command::Serve(args)) = cli.command else {
            panic!("expected serve");
        };
        // Env overrides may be set on a developer machine; only check the shape.
        assert!(args.max_body_bytes > 0);
        assert_eq!(ServeArgs::default().bind_address(), "0.0.0.0:7071");
    }

    #[test]
    fn convert_defaults_output_and_title() {
        let cli =
            Cli::try_parse_from(["courier", "-v", "convert", "out/report.html", "--landscape"])
                .unwrap();
        assert!(cli.verbose);
        let Some(Command::Convert(args)) = cli.command else {
            panic!("expected convert");
        };
        assert_eq!(args.output_path(), PathBuf::from("out/report.pdf"));
        assert_eq!(args.title(), "report");
        assert_eq!(args.page_size(), PageSize::A4);
        assert_eq!(args.orientation(), PageOrientation::Landscape);
    }

    #[test]
    fn smoke_defaults() {
        let cli = Cli::try_parse_from(["courier", "smoke"]).unwrap();
        let Some(Command::Smoke(args)) = cli.command else {
            panic!("expected smoke");
        };
        assert_eq!(args.base_url, DEFAULT_SMOKE_URL);
        assert_eq!(args.output, PathBuf::from("test_output.pdf"));
        assert_eq!(args.timeout, 30);
    }
}
