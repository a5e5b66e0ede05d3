//! CLI argument parsing for hitokoto

use clap::Parser;
use std::path::PathBuf;

use crate::api::ApiEndpoint;
use crate::domain::{Category, Criteria, SentenceId, parse_categories};
use crate::fetcher::Mirror;
use crate::output::OutputFormat;

const AFTER_HELP: &str = "\
Sentence types (-t):
  a  Anime          g  Other
  b  Comic          h  Film & TV
  c  Game           i  Poetry
  d  Literature     j  NetEase Cloud Music
  e  Original       k  Philosophy
  f  Internet       l  Witticism

Sentences come from the local bundle when one is present, otherwise from
the online API. Thanks to hitokoto.cn for the API and the sentence bundle.";

#[derive(Parser, Debug)]
#[command(name = "hitokoto")]
#[command(
    author,
    version,
    about = "Fetch a hitokoto sentence from the online API or the local bundle",
    long_about = None,
    after_help = AFTER_HELP,
    disable_version_flag = true
)]
pub struct Cli {
    /// Path to config file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Force the online API (in = international, cn = China)
    #[arg(short, long, value_enum, num_args = 0..=1, default_missing_value = "in", conflicts_with_all = ["bundle", "id"])]
    pub api: Option<ApiEndpoint>,

    /// Force the local bundle
    #[arg(short, long)]
    pub bundle: bool,

    /// Sentence types, one or more letters a-l (e.g. "a" or "adk"); bare lists them
    #[arg(short = 't', long = "type", value_name = "TYPES", value_parser = parse_category_list)]
    pub categories: Option<Option<CategoryList>>,

    /// Minimum length in characters
    #[arg(long = "min", value_name = "N")]
    pub min_length: Option<usize>,

    /// Maximum length in characters
    #[arg(long = "max", value_name = "N")]
    pub max_length: Option<usize>,

    /// Include the source (author and work) in text output
    #[arg(short = 'f', long = "from")]
    pub include_source: bool,

    /// Look up an exact sentence id or UUID (local bundle only)
    #[arg(short, long, value_name = "ID")]
    pub id: Option<SentenceId>,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub encode: OutputFormat,

    /// Check the local bundle's integrity
    #[arg(short = 'c', long = "check-bundle")]
    pub check_bundle: bool,

    /// Delete the local bundle
    #[arg(short = 'd', long = "delete-bundle")]
    pub delete_bundle: bool,

    /// Rebuild the bundle index from the sentence data
    #[arg(short = 'u', long = "update-index")]
    pub update_index: bool,

    /// Download the sentence bundle (of, gh, jsd; bare uses the configured mirror)
    #[arg(short = 'g', long = "get-bundle", value_enum, value_name = "MIRROR")]
    pub get_bundle: Option<Option<Mirror>>,

    /// Export N random sentences to a file
    #[arg(short = 'e', long = "echo", value_name = "N", num_args = 0..=1, default_missing_value = "10",
          value_parser = clap::value_parser!(u64).range(1..))]
    pub echo: Option<u64>,

    /// Export target file or directory
    #[arg(short = 'p', long = "path", value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Print debug logs to stderr
    #[arg(long)]
    pub debug: bool,

    /// Print version
    #[arg(short = 'v', long, action = clap::ArgAction::Version)]
    pub version: Option<bool>,
}

/// Categories given to -t, parsed as a single value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryList(pub Vec<Category>);

fn parse_category_list(s: &str) -> Result<CategoryList, String> {
    parse_categories(s).map(CategoryList)
}

impl Cli {
    /// Bare -t: list the categories instead of querying
    pub fn wants_category_list(&self) -> bool {
        matches!(self.categories, Some(None))
    }

    /// Whether an export was requested with -e or -p
    pub fn wants_export(&self) -> bool {
        self.echo.is_some() || self.path.is_some()
    }

    /// Filter criteria assembled from -t, --min, --max and -i
    pub fn criteria(&self) -> Criteria {
        Criteria {
            categories: self.categories.clone().flatten().map(|c| c.0).unwrap_or_default(),
            min_length: self.min_length,
            max_length: self.max_length,
            id: self.id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["hitokoto"]).unwrap();
        assert!(cli.api.is_none());
        assert!(!cli.bundle);
        assert!(cli.categories.is_none());
        assert_eq!(cli.encode, OutputFormat::Text);
        assert!(!cli.wants_export());
    }

    #[test]
    fn test_bare_optional_values() {
        let cli = Cli::try_parse_from(["hitokoto", "-a", "-g"]).unwrap();
        assert_eq!(cli.api, Some(ApiEndpoint::International));
        assert_eq!(cli.get_bundle, Some(None));

        let cli = Cli::try_parse_from(["hitokoto", "-t"]).unwrap();
        assert!(cli.wants_category_list());
        assert!(cli.criteria().categories.is_empty());

        let cli = Cli::try_parse_from(["hitokoto", "-e"]).unwrap();
        assert_eq!(cli.echo, Some(10));
        assert!(cli.wants_export());
    }

    #[test]
    fn test_explicit_values() {
        let cli = Cli::try_parse_from([
            "hitokoto", "-a", "cn", "-t", "ad", "--min", "5", "--max", "20", "-f", "--encode", "json",
        ])
        .unwrap();
        assert_eq!(cli.api, Some(ApiEndpoint::China));
        assert_eq!(
            cli.categories,
            Some(Some(CategoryList(vec![Category::Anime, Category::Literature])))
        );
        assert!(!cli.wants_category_list());
        assert_eq!(cli.min_length, Some(5));
        assert_eq!(cli.max_length, Some(20));
        assert!(cli.include_source);
        assert_eq!(cli.encode, OutputFormat::Json);

        let cli = Cli::try_parse_from(["hitokoto", "-g", "jsd"]).unwrap();
        assert_eq!(cli.get_bundle, Some(Some(Mirror::Jsdelivr)));

        let cli = Cli::try_parse_from(["hitokoto", "-i", "42", "-t", "k"]).unwrap();
        assert_eq!(cli.id, Some(SentenceId::Numeric(42)));
        let criteria = cli.criteria();
        assert_eq!(criteria.id, Some(SentenceId::Numeric(42)));
        assert_eq!(criteria.categories, vec![Category::Philosophy]);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(Cli::try_parse_from(["hitokoto", "-t", "z"]).is_err());
        assert!(Cli::try_parse_from(["hitokoto", "-g", "xx"]).is_err());
        assert!(Cli::try_parse_from(["hitokoto", "-i", "not-an-id"]).is_err());
        assert!(Cli::try_parse_from(["hitokoto", "-e", "0"]).is_err());
        assert!(Cli::try_parse_from(["hitokoto", "-a", "cn", "-b"]).is_err());
        assert!(Cli::try_parse_from(["hitokoto", "-a", "cn", "-i", "1"]).is_err());
    }
}
