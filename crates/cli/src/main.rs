mod build;
mod commands;
mod context;
mod render;

use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use segment_client::Channel;

use crate::context::Globals;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Delivery channel accepted by `campaign`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ChannelArg {
    Sms,
    Email,
}

impl From<ChannelArg> for Channel {
    fn from(arg: ChannelArg) -> Self {
        match arg {
            ChannelArg::Sms => Channel::Sms,
            ChannelArg::Email => Channel::Email,
        }
    }
}

/// Build audience segments and preview how many contacts they match.
#[derive(Parser)]
#[command(
    name = "segment",
    version,
    about = "Build audience segments and preview how many contacts they match"
)]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// More log output on stderr (-v debug, -vv trace); RUST_LOG wins if set
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Backend base URL, without the locale segment
    #[arg(long, global = true, env = "SEGMENT_API_URL")]
    api_url: Option<String>,

    /// Bearer token sent with every request
    #[arg(long, global = true, env = "SEGMENT_API_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Locale path segment (default: az)
    #[arg(long, global = true, env = "SEGMENT_LOCALE")]
    locale: Option<String>,

    /// TOML config file
    #[arg(long, global = true, env = "SEGMENT_CONFIG")]
    config: Option<PathBuf>,

    /// Read attribute schemas from this JSON file instead of the backend
    #[arg(long, global = true)]
    schema: Option<PathBuf>,

    /// Number of sample contacts requested with each preview
    #[arg(long, global = true)]
    limit: Option<u32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the attributes conditions can use, with their operators
    Attributes,

    /// Validate a filter file against the attribute schemas
    Check {
        /// Path to the filter JSON file
        filter: PathBuf,
    },

    /// Ask the backend how many contacts a filter file matches
    Preview {
        /// Path to the filter JSON file
        filter: PathBuf,
    },

    /// Edit a filter interactively, with live previews
    Build {
        /// Start from this filter file instead of an empty filter
        #[arg(long)]
        from: Option<PathBuf>,
        /// Do not contact the backend for previews
        #[arg(long)]
        no_preview: bool,
        /// Write the finished filter here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Create a campaign draft targeting a filter file
    Campaign {
        /// Path to the filter JSON file
        filter: PathBuf,
        /// Campaign name
        #[arg(long)]
        name: String,
        /// Delivery channel
        #[arg(long, value_enum)]
        channel: ChannelArg,
        /// Message body
        #[arg(long)]
        content: String,
        /// Subject line (required for email)
        #[arg(long)]
        subject: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let (output, quiet) = (cli.output, cli.quiet);
    let command = cli.command;
    let globals = Globals {
        output,
        quiet,
        api_url: cli.api_url,
        token: cli.token,
        locale: cli.locale,
        config: cli.config,
        schema: cli.schema,
        limit: cli.limit,
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            report_error(&format!("failed to start async runtime: {}", e), output, quiet);
            process::exit(1);
        }
    };

    let result = runtime.block_on(async {
        match command {
            Commands::Attributes => commands::cmd_attributes(&globals).await,
            Commands::Check { filter } => commands::cmd_check(&globals, &filter).await,
            Commands::Preview { filter } => commands::cmd_preview(&globals, &filter).await,
            Commands::Build {
                from,
                no_preview,
                out,
            } => build::run_build(&globals, from.as_deref(), no_preview, out.as_deref()).await,
            Commands::Campaign {
                filter,
                name,
                channel,
                content,
                subject,
            } => {
                let message = segment_client::CampaignMessage {
                    name,
                    channel: channel.into(),
                    subject,
                    content,
                };
                commands::cmd_campaign(&globals, &filter, message).await
            }
        }
    });
    // A preview request still blocking on the network must not hold up exit.
    runtime.shutdown_timeout(Duration::from_millis(200));

    if let Err(msg) = result {
        report_error(&msg, output, quiet);
        process::exit(1);
    }
}

/// Log to stderr. `RUST_LOG` takes precedence over `-v`.
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("error: {}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}
