/// Cadence - terminal player for the Cadence music server
use cadence_console::{session::Session, view, ConsoleConfig};
use cadence_server_client::{CadenceClient, PlaylistDownloadEvent};
use clap::{Parser, Subcommand};
use futures_util::StreamExt;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "cadence")]
#[command(about = "Terminal player for the Cadence music server", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Server API base URL (overrides configuration)
    #[arg(short, long, global = true, env = "CADENCE_URL")]
    server: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive player (default)
    Play,
    /// List playlists and exit
    Playlists,
    /// Download every track of a playlist on the server
    Download {
        /// Playlist id
        playlist_id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = ConsoleConfig::load(cli.config.as_deref())?;
    if let Some(url) = cli.server {
        config.server.url = url;
    }
    config.validate()?;

    // Initialize tracing; logs go to stderr so they do not mix with the player
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let client = CadenceClient::new(config.server_config())?;
    tracing::info!("Server: {}", client.url());

    match cli.command.unwrap_or(Commands::Play) {
        Commands::Play => {
            Session::new(client, &config).run().await?;
        }
        Commands::Playlists => {
            list_playlists(&client).await?;
        }
        Commands::Download { playlist_id } => {
            download_playlist(&client, &playlist_id).await?;
        }
    }

    Ok(())
}

async fn list_playlists(client: &CadenceClient) -> anyhow::Result<()> {
    let playlists = client.list_playlists().await?;

    if playlists.is_empty() {
        println!("No playlists");
        return Ok(());
    }

    println!("Playlists:");
    for playlist in playlists {
        println!("  {} - {}", playlist.id, view::playlist_line(&playlist));
    }
    Ok(())
}

async fn download_playlist(client: &CadenceClient, playlist_id: &str) -> anyhow::Result<()> {
    let events = client.download_playlist(playlist_id).await?;
    let mut events = std::pin::pin!(events);

    let mut total = 0;
    let mut failed = 0;
    while let Some(event) = events.next().await {
        match event? {
            PlaylistDownloadEvent::Started { num_tracks } => {
                total = num_tracks;
                println!("Downloading {num_tracks} tracks");
            }
            PlaylistDownloadEvent::Progress { index, error: None } => {
                println!("[{}/{}] done", index + 1, total);
            }
            PlaylistDownloadEvent::Progress {
                index,
                error: Some(error),
            } => {
                failed += 1;
                println!("[{}/{}] failed: {}", index + 1, total, error);
            }
        }
    }

    if failed > 0 {
        tracing::warn!(failed, "Some tracks could not be downloaded");
    }
    println!("Finished ({failed} failed)");
    Ok(())
}
