use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Terminal,
    Json,
    Markdown,
}

#[derive(Parser, Debug)]
#[command(
    name = "sg-audit",
    version,
    about = "Usage and risk auditor for cloud security-group inventories",
    long_about = "sg-audit analyzes an inventory snapshot of security groups and the \
resources referencing them, reporting exposure findings, usage scores, \
deletion-safety verdicts, and consolidation candidates."
)]
pub struct Cli {
    /// Inventory to audit: a directory of per-section JSON files or a
    /// single combined snapshot file
    pub inventory: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Terminal)]
    pub format: OutputFormat,

    /// Write the rendered report to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Config file (defaults to .sg-audit.yaml in the working
    /// directory when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Exit non-zero on any finding, not just critical/high
    #[arg(short, long)]
    pub strict: bool,

    /// Write the generated cleanup script to this path
    #[arg(long)]
    pub remediation_script: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_basic_args() {
        let cli = Cli::try_parse_from(["sg-audit", "./data"]).unwrap();
        assert_eq!(cli.inventory, PathBuf::from("./data"));
        assert!(!cli.strict);
        assert!(matches!(cli.format, OutputFormat::Terminal));
    }

    #[test]
    fn test_parse_format_json() {
        let cli = Cli::try_parse_from(["sg-audit", "--format", "json", "./data"]).unwrap();
        assert!(matches!(cli.format, OutputFormat::Json));
    }

    #[test]
    fn test_parse_format_markdown() {
        let cli = Cli::try_parse_from(["sg-audit", "-f", "markdown", "./data"]).unwrap();
        assert!(matches!(cli.format, OutputFormat::Markdown));
    }

    #[test]
    fn test_parse_strict_mode() {
        let cli = Cli::try_parse_from(["sg-audit", "--strict", "./data"]).unwrap();
        assert!(cli.strict);
    }

    #[test]
    fn test_parse_remediation_script() {
        let cli =
            Cli::try_parse_from(["sg-audit", "--remediation-script", "cleanup.sh", "./data"])
                .unwrap();
        assert_eq!(cli.remediation_script, Some(PathBuf::from("cleanup.sh")));
    }

    #[test]
    fn test_inventory_is_required() {
        assert!(Cli::try_parse_from(["sg-audit"]).is_err());
    }
}
