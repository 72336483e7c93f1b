use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Parser;
use relfind::config::HttpConfig;
use relfind::finder::{FinderFactory, FinderSpec, Platform, ReleaseQuery, TAG_PREFIX, TagSelector};
use relfind::http::HttpClient;

/// relfind - resolve release asset URLs
///
/// Prints the download URLs of a GitHub or GitLab release, one per line.
///
/// GITHUB_TOKEN and GITLAB_TOKEN are sent to their respective APIs when set.
/// This is useful for private repositories or avoiding rate limits.
///
/// Examples:
///   relfind assets github owner/repo               # Latest stable release
///   relfind assets gitlab group/project --tag v1.2 # Release tagged v1.2
#[derive(Parser, Debug)]
#[command(author, version = env!("RELFIND_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// GitHub API URL (defaults to https://api.github.com)
    #[arg(
        long = "github-api-url",
        env = "RELFIND_GITHUB_API_URL",
        value_name = "URL",
        global = true
    )]
    pub github_api_url: Option<String>,

    /// GitLab API URL (defaults to https://gitlab.com/api/v4)
    #[arg(
        long = "gitlab-api-url",
        env = "RELFIND_GITLAB_API_URL",
        value_name = "URL",
        global = true
    )]
    pub gitlab_api_url: Option<String>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// List the assets attached to a release
    Assets(AssetsArgs),

    /// Print the source tarball URL for a tag
    Source(SourceArgs),

    /// Print a URL as-is
    Direct(DirectArgs),
}

#[derive(clap::Args, Debug)]
pub struct AssetsArgs {
    /// github or gitlab
    #[arg(value_name = "PLATFORM")]
    pub platform: Platform,

    /// "owner/repo" on GitHub, project path or id on GitLab
    #[arg(value_name = "REPO")]
    pub repo: String,

    /// Release tag; "latest" or omitted for the most recent release
    #[arg(long, value_name = "TAG")]
    pub tag: Option<String>,

    /// Consider pre-releases
    #[arg(long)]
    pub prerelease: bool,

    /// Only accept releases created at or after this time
    #[arg(long, value_name = "RFC3339")]
    pub since: Option<DateTime<Utc>>,
}

#[derive(clap::Args, Debug)]
pub struct SourceArgs {
    #[arg(value_name = "PLATFORM")]
    pub platform: Platform,

    #[arg(value_name = "REPO")]
    pub repo: String,

    #[arg(value_name = "TAG")]
    pub tag: String,

    /// Archive name without extension
    #[arg(value_name = "TOOL")]
    pub tool: String,
}

#[derive(clap::Args, Debug)]
pub struct DirectArgs {
    #[arg(value_name = "URL")]
    pub url: String,
}

/// `None`/"latest" pick the newest release; a bare tag gets the `tags/` prefix.
fn tag_selector(tag: Option<&str>) -> Result<TagSelector> {
    match tag {
        None | Some("latest") => Ok(TagSelector::Latest),
        Some(t) if t.starts_with(TAG_PREFIX) => Ok(t.parse()?),
        Some(t) => Ok(TagSelector::tag(t)),
    }
}

impl Commands {
    fn into_spec(self) -> Result<FinderSpec> {
        let spec = match self {
            Commands::Assets(args) => {
                let mut query = ReleaseQuery::new(args.repo, tag_selector(args.tag.as_deref())?)
                    .prerelease(args.prerelease);
                if let Some(since) = args.since {
                    query = query.min_time(since);
                }
                FinderSpec::Assets {
                    platform: args.platform,
                    query,
                }
            }
            Commands::Source(args) => FinderSpec::Source {
                platform: args.platform,
                tool: args.tool,
                repo: args.repo,
                tag: args.tag,
            },
            Commands::Direct(args) => FinderSpec::Direct { url: args.url },
        };
        Ok(spec)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let mut config = HttpConfig::from_env()?;
    if let Some(url) = cli.github_api_url {
        config = config.github_api_url(url);
    }
    if let Some(url) = cli.gitlab_api_url {
        config = config.gitlab_api_url(url);
    }

    let transport = Arc::new(HttpClient::from_config(config.clone())?);
    let factory = FinderFactory::from_config(transport, &config);
    let finder = factory.create(cli.command.into_spec()?);

    match finder.find().await {
        Ok(urls) => {
            for url in urls {
                println!("{}", url);
            }
        }
        Err(e) if e.is_no_upgrade() => eprintln!("Already up to date: {}", e),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
