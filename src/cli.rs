// src/cli.rs
use clap::Parser;

/// Bounty-Scout: bug bounty program discovery
///
/// Check domains for bug bounty and vulnerability disclosure programs using
/// security.txt, homepage links, well-known platform paths and a manual
/// registry.
#[derive(Parser, Debug, Clone)]
#[command(name = "bounty-scout")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Domains or URLs to look up
    #[arg(value_name = "DOMAIN")]
    pub domains: Vec<String>,

    // ===== Configuration =====
    /// Path to TOML config file (defaults apply when it does not exist)
    #[arg(short = 'c', long = "config", default_value = "bounty-scout.toml")]
    pub config: String,

    // ===== Output Format =====
    /// Output reports in JSONL format
    #[arg(short = 'j', long = "json")]
    pub json: bool,

    /// Output reports in CSV format
    #[arg(long = "csv")]
    pub csv: bool,

    /// Write output to file instead of stdout
    #[arg(short = 'o', long = "output")]
    pub output: Option<String>,

    // ===== Manual Registry =====
    /// Register a program URL for a domain
    #[arg(long = "add-manual", value_name = "DOMAIN=URL", value_parser = parse_manual_pair)]
    pub add_manual: Option<(String, String)>,

    /// Remove a registered program URL
    #[arg(long = "remove-manual", value_name = "DOMAIN=URL", value_parser = parse_manual_pair)]
    pub remove_manual: Option<(String, String)>,

    /// List registered programs and exit
    #[arg(long = "list-manual")]
    pub list_manual: bool,

    // ===== Modes =====
    /// Answer JSON requests on stdin, one per line; the first DOMAIN becomes the active tab
    #[arg(long = "serve")]
    pub serve: bool,

    /// Render a found/not-found badge per DOMAIN through the tab cache
    #[arg(long = "badge")]
    pub badge: bool,

    /// Load platform API keys from the settings file into this session
    #[arg(long = "unlock")]
    pub unlock: bool,

    // ===== Display & Statistics =====
    /// Print lookup statistics when done
    #[arg(long = "stats")]
    pub stats: bool,

    /// Disable progress indicator
    #[arg(long = "no-progress")]
    pub no_progress: bool,

    // ===== Logging =====
    /// Verbose logging (set log level to debug)
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Quiet logging (set log level to warn)
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,
}

/// Parse `DOMAIN=URL`
fn parse_manual_pair(value: &str) -> Result<(String, String), String> {
    match value.split_once('=') {
        Some((domain, url)) if !domain.trim().is_empty() && !url.trim().is_empty() => {
            Ok((domain.trim().to_string(), url.trim().to_string()))
        }
        _ => Err(format!("expected DOMAIN=URL, got {:?}", value)),
    }
}

impl Cli {
    /// Validate flag combinations and return errors for invalid usage
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.json && self.csv {
            anyhow::bail!("Cannot specify multiple output formats. Choose one of: --json or --csv");
        }

        if self.serve && self.badge {
            anyhow::bail!("Cannot use --serve and --badge together");
        }

        if self.serve && (self.json || self.csv || self.output.is_some()) {
            anyhow::bail!("--serve always answers with JSON on stdout; drop --json, --csv and --output");
        }

        if self.is_registry_command() && (self.serve || self.badge || !self.domains.is_empty()) {
            anyhow::bail!(
                "Registry commands (--add-manual, --remove-manual, --list-manual) cannot be combined with lookups"
            );
        }

        if !self.serve && !self.is_registry_command() && self.domains.is_empty() {
            anyhow::bail!("No domains given. Pass at least one DOMAIN, or use --serve");
        }

        if self.verbose && self.quiet {
            anyhow::bail!("Cannot specify both --verbose and --quiet");
        }

        Ok(())
    }

    pub fn is_registry_command(&self) -> bool {
        self.add_manual.is_some() || self.remove_manual.is_some() || self.list_manual
    }

    /// Determine the output format based on flags
    pub fn output_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else if self.csv {
            OutputFormat::Csv
        } else {
            OutputFormat::Human
        }
    }

    /// Progress only makes sense for plain lookups with human output
    pub fn should_show_progress(&self) -> bool {
        !self.no_progress && !self.json && !self.csv && !self.serve && !self.badge
    }

    /// Log level from -v/-q, if either was given
    pub fn log_level(&self) -> Option<&str> {
        if self.verbose {
            Some("debug")
        } else if self.quiet {
            Some("warn")
        } else {
            None
        }
    }
}

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable colored text output (default)
    Human,
    /// JSON Lines format (one JSON object per line)
    Json,
    Csv,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_path() {
        let cli = Cli::parse_from(["bounty-scout", "example.com"]);
        assert_eq!(cli.config, "bounty-scout.toml");
        assert_eq!(cli.domains, vec!["example.com".to_string()]);
    }

    #[test]
    fn test_custom_config_path() {
        let cli = Cli::parse_from(["bounty-scout", "--config", "custom.toml", "example.com"]);
        assert_eq!(cli.config, "custom.toml");
    }

    #[test]
    fn test_output_formats() {
        let cli = Cli::parse_from(["bounty-scout", "--json", "example.com"]);
        assert_eq!(cli.output_format(), OutputFormat::Json);

        let cli = Cli::parse_from(["bounty-scout", "--csv", "example.com"]);
        assert_eq!(cli.output_format(), OutputFormat::Csv);

        let cli = Cli::parse_from(["bounty-scout", "example.com"]);
        assert_eq!(cli.output_format(), OutputFormat::Human);
    }

    #[test]
    fn test_multiple_formats_invalid() {
        let cli = Cli::parse_from(["bounty-scout", "--json", "--csv", "example.com"]);
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_domains_required_for_lookup() {
        let cli = Cli::parse_from(["bounty-scout"]);
        assert!(cli.validate().is_err());

        let cli = Cli::parse_from(["bounty-scout", "--serve"]);
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_serve_conflicts() {
        let cli = Cli::parse_from(["bounty-scout", "--serve", "--badge", "example.com"]);
        assert!(cli.validate().is_err());

        let cli = Cli::parse_from(["bounty-scout", "--serve", "--json"]);
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_add_manual_pair() {
        let cli = Cli::parse_from(["bounty-scout", "--add-manual", "example.com=https://example.com/bounty"]);
        assert_eq!(
            cli.add_manual,
            Some(("example.com".to_string(), "https://example.com/bounty".to_string()))
        );
        assert!(cli.is_registry_command());
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_add_manual_requires_both_halves() {
        assert!(Cli::try_parse_from(["bounty-scout", "--add-manual", "example.com"]).is_err());
        assert!(Cli::try_parse_from(["bounty-scout", "--add-manual", "=https://x"]).is_err());
    }

    #[test]
    fn test_registry_command_with_domains_invalid() {
        let cli = Cli::parse_from(["bounty-scout", "--list-manual", "example.com"]);
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_verbose_and_quiet_invalid() {
        let cli = Cli::parse_from(["bounty-scout", "--verbose", "--quiet", "example.com"]);
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_progress_flags() {
        let cli = Cli::parse_from(["bounty-scout", "example.com"]);
        assert!(cli.should_show_progress());

        let cli = Cli::parse_from(["bounty-scout", "--json", "example.com"]);
        assert!(!cli.should_show_progress());

        let cli = Cli::parse_from(["bounty-scout", "--badge", "example.com"]);
        assert!(!cli.should_show_progress());
    }

    #[test]
    fn test_log_level() {
        let cli = Cli::parse_from(["bounty-scout", "-v", "example.com"]);
        assert_eq!(cli.log_level(), Some("debug"));

        let cli = Cli::parse_from(["bounty-scout", "-q", "example.com"]);
        assert_eq!(cli.log_level(), Some("warn"));

        let cli = Cli::parse_from(["bounty-scout", "example.com"]);
        assert_eq!(cli.log_level(), None);
    }

    #[test]
    fn test_short_flags() {
        let cli = Cli::parse_from(["bounty-scout", "-c", "test.toml", "-j", "-o", "out.jsonl", "a.com", "b.com"]);
        assert_eq!(cli.config, "test.toml");
        assert!(cli.json);
        assert_eq!(cli.output, Some("out.jsonl".to_string()));
        assert_eq!(cli.domains.len(), 2);
    }
}
