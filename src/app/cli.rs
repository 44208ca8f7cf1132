use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "slideforge")]
#[command(about = "Staged slide-deck authoring with an automated asset pipeline")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("SLIDEFORGE_GIT_SHA"), ")"))]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Studio directory (defaults to $SLIDEFORGE_HOME or ~/.slideforge)
    #[arg(long, global = true)]
    pub home: Option<PathBuf>,

    /// Configuration file (defaults to <home>/studio.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a document from an outline
    New {
        /// Storage key for the document
        key: String,

        /// Project name (defaults to the key)
        #[arg(short, long)]
        name: Option<String>,

        /// Slide title; repeat once per slide
        #[arg(short, long = "slide", required = true)]
        slides: Vec<String>,

        #[arg(long)]
        brand: Option<String>,

        #[arg(long)]
        tone: Option<String>,

        /// Approve the Strategy stage right away
        #[arg(long)]
        approve: bool,

        /// Overwrite an existing document with the same key
        #[arg(long)]
        force: bool,
    },

    /// Run the assets, layout and copy pipeline on a stored document
    Run {
        key: String,
    },

    /// Apply one JSON-encoded command to a stored document
    Apply {
        key: String,

        /// e.g. '{"type":"ApproveStage","payload":{"stage":1}}'
        command: String,
    },

    /// Remove the background from a PNG file
    Cutout {
        input: PathBuf,

        output: PathBuf,

        #[arg(short, long, value_enum, default_value_t = CutoutArg::FloodFill)]
        method: CutoutArg,

        /// Color distance below which a pixel counts as background (0-442)
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(..=442))]
        tolerance: Option<u32>,
    },

    /// Check a document JSON file
    Validate {
        file: PathBuf,

        /// Salvage what decodes instead of rejecting the file
        #[arg(long)]
        lenient: bool,
    },

    /// Write a zip archive of a stored document
    Export {
        key: String,

        /// Archive path (defaults to <home>/exports/<key>-<timestamp>.zip)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Summarize a stored document, or list stored keys
    Show {
        key: Option<String>,

        /// Print the full document as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CutoutArg {
    FloodFill,
    ColorKey,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_new_with_slides() {
        let cli = Cli::try_parse_from([
            "slideforge", "new", "launch", "-s", "Welcome", "-s", "Pricing", "--approve",
        ])
        .unwrap();
        match cli.command {
            Command::New {
                key,
                slides,
                approve,
                name,
                ..
            } => {
                assert_eq!(key, "launch");
                assert_eq!(slides, vec!["Welcome", "Pricing"]);
                assert!(approve);
                assert!(name.is_none());
            }
            _ => panic!("expected new"),
        }
    }

    #[test]
    fn test_new_requires_a_slide() {
        assert!(Cli::try_parse_from(["slideforge", "new", "launch"]).is_err());
    }

    #[test]
    fn test_cutout_tolerance_is_bounded() {
        let parse = |tolerance: &str| {
            Cli::try_parse_from([
                "slideforge", "cutout", "in.png", "out.png", "--tolerance", tolerance,
            ])
        };
        assert!(parse("442").is_ok());
        assert!(parse("70000").is_err());
    }

    #[test]
    fn test_parse_cutout_method_and_global_home() {
        let cli = Cli::try_parse_from([
            "slideforge", "cutout", "in.png", "out.png", "--method", "color-key", "--home", "/tmp/s",
        ])
        .unwrap();
        assert_eq!(cli.home, Some(PathBuf::from("/tmp/s")));
        match cli.command {
            Command::Cutout { method, tolerance, .. } => {
                assert_eq!(method, CutoutArg::ColorKey);
                assert!(tolerance.is_none());
            }
            _ => panic!("expected cutout"),
        }
    }
}
