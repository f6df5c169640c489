//! b2 - command-line access to B2 cloud object storage

use anyhow::Context;
use b2_client::{B2Client, Bucket, BucketType, Config, Session};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "b2")]
#[command(about = "Manage buckets and files in B2 cloud object storage")]
#[command(version)]
struct Args {
    /// Account ID
    #[arg(long, env = "B2_ACCOUNT_ID")]
    account_id: String,

    /// Application key
    #[arg(long, env = "B2_APPLICATION_KEY", hide_env_values = true)]
    application_key: String,

    /// Authorization endpoint
    #[arg(long, default_value = b2_client::DEFAULT_API_URL, env = "B2_API_URL")]
    api_url: String,

    /// Enable debug logging
    #[arg(short, long, env = "B2_DEBUG")]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List buckets
    Buckets,
    /// Create a bucket
    CreateBucket {
        name: String,
        /// Allow anyone to download files
        #[arg(long)]
        public: bool,
    },
    /// Delete an empty bucket
    DeleteBucket { bucket_id: String },
    /// List files in a bucket
    Files { bucket_id: String },
    /// Upload a local file
    Upload {
        bucket_id: String,
        path: PathBuf,
        /// Name to store the file under (defaults to the local file name)
        #[arg(long)]
        name: Option<String>,
    },
    /// Download a file by ID
    Download { file_id: String, destination: PathBuf },
    /// Show file metadata
    Info { file_id: String },
    /// Delete a file version
    DeleteFile { file_id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("b2_client={},b2_cli={}", log_level, log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let client = B2Client::new(Config::new(args.api_url))?;
    let session = client
        .authorize_account(&args.account_id, &args.application_key)
        .await
        .context("authorization failed")?;
    tracing::debug!(api_url = %session.api_url, "Authorized");

    run(&client, &session, args.command).await
}

async fn run(client: &B2Client, session: &Session, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Buckets => {
            for bucket in client.list_buckets(session).await? {
                println!("{}\t{}\t{}", bucket.id, bucket.bucket_type, bucket.name);
            }
        }
        Command::CreateBucket { name, public } => {
            let bucket_type = if public {
                BucketType::Public
            } else {
                BucketType::Private
            };
            let bucket = client.create_bucket(session, &name, bucket_type).await?;
            println!("{}", bucket.id);
        }
        Command::DeleteBucket { bucket_id } => {
            let bucket = find_bucket(client, session, &bucket_id).await?;
            client.delete_bucket(session, &bucket).await?;
        }
        Command::Files { bucket_id } => {
            let bucket = find_bucket(client, session, &bucket_id).await?;
            for file in client.list_files(session, &bucket).await? {
                println!("{}\t{}\t{}", file.id, file.size, file.name);
            }
        }
        Command::Upload {
            bucket_id,
            path,
            name,
        } => {
            let name = match name {
                Some(name) => name,
                None => path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(str::to_string)
                    .context("cannot derive a file name; pass --name")?,
            };
            let bucket = find_bucket(client, session, &bucket_id).await?;
            let ticket = client.get_upload_url(session, &bucket).await?;
            let file = client.upload_file(&ticket, &path, &name).await?;
            println!("{}\t{}", file.id, file.content_type);
        }
        Command::Download {
            file_id,
            destination,
        } => {
            let written = client
                .download_file_by_id(session, &file_id, &destination)
                .await?;
            tracing::info!("Wrote {} bytes to {}", written, destination.display());
        }
        Command::Info { file_id } => {
            let file = client.get_file_info(session, &file_id).await?;
            println!("name:         {}", file.name);
            println!("id:           {}", file.id);
            println!("content-type: {}", file.content_type);
            println!("size:         {}", file.size);
            if let Some(uploaded_at) = file.uploaded_at() {
                println!("uploaded:     {}", uploaded_at.to_rfc3339());
            }
        }
        Command::DeleteFile { file_id } => {
            let file = client.get_file_info(session, &file_id).await?;
            client.delete_file(session, &file).await?;
        }
    }

    Ok(())
}

async fn find_bucket(client: &B2Client, session: &Session, bucket_id: &str) -> anyhow::Result<Bucket> {
    client
        .list_buckets(session)
        .await?
        .into_iter()
        .find(|b| b.id == bucket_id)
        .with_context(|| format!("no bucket with ID {}", bucket_id))
}
