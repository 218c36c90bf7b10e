/// Command handlers, one per subcommand
pub mod handlers;

/// Plain-text rendering of images and view state
pub mod render;

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::config::{
    API_URL_ENV, ClientConfig, DEFAULT_API_URL, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_STORAGE_URL,
    REQUEST_TIMEOUT_ENV, STORAGE_URL_ENV,
};
use crate::domain::models::{DEFAULT_GALLERY_LIMIT, StatusFilter, Transformation};
use crate::infrastructure::api::ImageApiClient;
use crate::infrastructure::storage::ObjectStorage;

#[derive(Parser, Debug)]
#[command(name = "henkan", version)]
#[command(about = "Submit, inspect and watch images on a henkan transformation service")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Base URL of the image API
    #[arg(long, env = API_URL_ENV, default_value = DEFAULT_API_URL, global = true)]
    pub api_url: String,
    /// Bucket endpoint objects are served from
    #[arg(long, env = STORAGE_URL_ENV, default_value = DEFAULT_STORAGE_URL, global = true)]
    pub storage_url: String,
    /// Request timeout in seconds (not applied to live streams)
    #[arg(long, env = REQUEST_TIMEOUT_ENV, default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS, global = true)]
    pub timeout: u64,
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
    /// Print JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,
}

impl GlobalArgs {
    pub fn config(&self) -> crate::shared::errors::Result<ClientConfig> {
        Ok(ClientConfig::new(&self.api_url, &self.storage_url)?
            .with_request_timeout(Duration::from_secs(self.timeout)))
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List one page of images
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = DEFAULT_GALLERY_LIMIT)]
        limit: u32,
        /// Only show images in this status (pending, processing, processed, completed, failed, all)
        #[arg(long, default_value = "all")]
        status: StatusFilter,
        /// Only show images whose id contains this text
        #[arg(long)]
        search: Option<String>,
    },
    /// Show one image with its technical details
    Get { id: String },
    /// Show an image's metadata only
    Metadata { id: String },
    /// Submit a source URL for processing
    Create {
        /// Absolute http(s) URL of the source image
        url: String,
        /// Transformation step, in order: resize:WxH, grayscale, trim:N, blur:S, rotate:A
        #[arg(short = 't', long = "transform", required = true)]
        transformations: Vec<Transformation>,
        /// Stream status changes until processing finishes
        #[arg(long)]
        follow: bool,
    },
    /// Replace an image's transformation list
    Update {
        id: String,
        #[arg(short = 't', long = "transform", required = true)]
        transformations: Vec<Transformation>,
    },
    /// Delete an image
    Delete {
        id: String,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
    /// Print live updates until Ctrl-C (all images, or one)
    Watch { id: Option<String> },
    /// Print the public URL of a storage key
    Url { key: String },
    /// Save an image's transformed (or original) bytes to a file
    Download {
        id: String,
        /// Fetch the original instead of the transformed output
        #[arg(long)]
        original: bool,
        #[arg(short, long)]
        output: PathBuf,
    },
}

/// Clients and output mode shared by every handler
pub struct Context {
    pub api: ImageApiClient,
    pub storage: ObjectStorage,
    pub json: bool,
}

impl Context {
    pub fn new(global: &GlobalArgs) -> anyhow::Result<Self> {
        let config = global.config()?;
        Ok(Self {
            api: ImageApiClient::new(&config)?,
            storage: ObjectStorage::new(&config)?,
            json: global.json,
        })
    }
}

pub async fn run_cli(cli: Cli) -> anyhow::Result<()> {
    let ctx = Context::new(&cli.global)?;

    match cli.command {
        Commands::List { page, limit, status, search } => {
            handlers::handle_list(&ctx, page, limit, status, search).await
        }
        Commands::Get { id } => handlers::handle_get(&ctx, &id).await,
        Commands::Metadata { id } => handlers::handle_metadata(&ctx, &id).await,
        Commands::Create { url, transformations, follow } => {
            handlers::handle_create(&ctx, url, transformations, follow).await
        }
        Commands::Update { id, transformations } => {
            handlers::handle_update(&ctx, &id, transformations).await
        }
        Commands::Delete { id, yes } => handlers::handle_delete(&ctx, &id, yes).await,
        Commands::Watch { id } => handlers::handle_watch(&ctx, id).await,
        Commands::Url { key } => handlers::handle_url(&ctx, &key),
        Commands::Download { id, original, output } => {
            handlers::handle_download(&ctx, &id, original, &output).await
        }
    }
}
