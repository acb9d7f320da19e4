/// Console error types
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConsoleError>;

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid command: {0}")]
    Command(String),

    #[error("Server error: {0}")]
    Server(#[from] cadence_server_client::ServerClientError),

    #[error("Player error: {0}")]
    Player(#[from] cadence_player::PlayerError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
