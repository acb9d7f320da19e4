//! Session tests against a mock Cadence server.

use cadence_console::command::{Command, Target};
use cadence_console::config::{
    ConsoleConfig, LoggingSettings, PlayerSettings, ServerSettings, TelemetrySettings,
};
use cadence_console::{ConsoleError, Session};
use cadence_player::{PlayId, TransportState};
use cadence_server_client::{CadenceClient, ServerConfig};
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(url: String) -> ConsoleConfig {
    ConsoleConfig {
        server: ServerSettings {
            url,
            request_timeout_secs: 5,
            connect_timeout_secs: 5,
        },
        telemetry: TelemetrySettings {
            report_timeout_secs: 5,
        },
        player: PlayerSettings {
            tick_interval_ms: 500,
        },
        logging: LoggingSettings {
            filter: "off".to_string(),
        },
    }
}

fn session_for(server: &MockServer) -> Session<Vec<u8>> {
    let config = config_for(format!("{}/api/v1", server.uri()));
    let client = CadenceClient::new(config.server_config()).unwrap();
    Session::with_output(client, &config, Vec::new())
}

fn output(session: &Session<Vec<u8>>) -> String {
    String::from_utf8_lossy(session.output()).into_owned()
}

fn track_json(id: &str, duration: u32) -> serde_json::Value {
    serde_json::json!({
        "track_id": id,
        "track_name": format!("Song {}", id),
        "duration": duration,
        "artists": ["Artist"]
    })
}

/// Playlist `p1` with tracks `a` and `b` and play sessions `play-<track>`
async fn mount_library(server: &MockServer, duration: u32) {
    mount_library_with_play_delay(server, duration, Duration::ZERO).await;
}

async fn mount_library_with_play_delay(server: &MockServer, duration: u32, delay: Duration) {
    Mock::given(method("GET"))
        .and(path("/api/v1/playlists"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "id": "p1", "name": "Morning" }
        ])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/playlists/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "p1",
            "name": "Morning",
            "tracks": [track_json("a", duration), track_json("b", duration)]
        })))
        .mount(server)
        .await;

    for id in ["a", "b"] {
        Mock::given(method("POST"))
            .and(path(format!("/api/v1/record/play/{id}")))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "play_id": format!("play-{id}") }))
                    .set_delay(delay),
            )
            .mount(server)
            .await;
    }
}

async fn mount_streams(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path_regex(r"^/api/v1/play/[a-z]+$"))
        .respond_with(ResponseTemplate::new(206).set_body_bytes(vec![0u8]))
        .mount(server)
        .await;
}

async fn play_morning(session: &mut Session<Vec<u8>>) {
    session.start().await.unwrap();
    session
        .execute(Command::PlayPlaylist {
            target: Target::Index(0),
            shuffle: false,
        })
        .await
        .unwrap();
    session.settle().await.unwrap();
}

#[tokio::test]
async fn start_lists_playlists() {
    let server = MockServer::start().await;
    mount_library(&server, 200).await;

    let mut session = session_for(&server);
    session.start().await.unwrap();

    assert!(output(&session).contains("1. Morning"));
}

#[tokio::test]
async fn start_fails_without_server() {
    let config = config_for("http://127.0.0.1:1/api/v1".to_string());
    let client = CadenceClient::new(ServerConfig::new(config.server.url.clone())).unwrap();
    let mut session = Session::with_output(client, &config, Vec::new());

    assert!(matches!(
        session.start().await,
        Err(ConsoleError::Server(_))
    ));
}

#[tokio::test]
async fn playing_a_playlist_opens_a_session_and_loads_lyrics() {
    let server = MockServer::start().await;
    mount_library(&server, 200).await;
    mount_streams(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/v1/lyrics/a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "lyrics": "[00:00.40] hello\n[00:05.00] again"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = session_for(&server);
    play_morning(&mut session).await;

    let state = session.store().snapshot();
    assert_eq!(state.current_track_id(), Some("a"));
    assert_eq!(state.play_id, Some(PlayId::new("play-a")));
    assert_eq!(state.transport(), TransportState::Playing);
    assert!(output(&session).contains("Now playing: Artist - Song a (3:20)"));

    // One tick moves the playhead past the first lyric line
    session.advance_clock().unwrap();
    assert!(output(&session).contains("~ hello"));

    // Seeking to a lyric line moves the playhead
    session.execute(Command::Line(1)).await.unwrap();
    assert_eq!(session.store().snapshot().current_time, 5.0);
}

#[tokio::test]
async fn track_end_advances_without_skip_report() {
    let server = MockServer::start().await;
    mount_library(&server, 1).await;
    mount_streams(&server).await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/api/v1/record/skip/.*$"))
        .respond_with(ResponseTemplate::new(200).set_body_string("null"))
        .expect(0)
        .mount(&server)
        .await;

    let mut session = session_for(&server);
    play_morning(&mut session).await;

    session.advance_clock().unwrap();
    session.advance_clock().unwrap();
    session.settle().await.unwrap();

    let state = session.store().snapshot();
    assert_eq!(state.current_track_id(), Some("b"));
    assert_eq!(state.play_id, Some(PlayId::new("play-b")));
    assert!(output(&session).contains("Now playing: Artist - Song b"));
}

#[tokio::test]
async fn skipping_reports_position() {
    let server = MockServer::start().await;
    mount_library(&server, 200).await;
    mount_streams(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/v1/record/skip/play-a"))
        .respond_with(ResponseTemplate::new(200).set_body_string("null"))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = session_for(&server);
    play_morning(&mut session).await;

    session.execute(Command::Next).await.unwrap();
    session.settle().await.unwrap();

    assert_eq!(session.store().snapshot().current_track_id(), Some("b"));
}

#[tokio::test]
async fn slow_play_report_does_not_hold_up_the_session() {
    let server = MockServer::start().await;
    mount_library_with_play_delay(&server, 200, Duration::from_secs(2)).await;
    mount_streams(&server).await;

    let mut session = session_for(&server);
    session.start().await.unwrap();

    let started = Instant::now();
    session
        .execute(Command::PlayPlaylist {
            target: Target::Index(0),
            shuffle: false,
        })
        .await
        .unwrap();
    session.render_events().await.unwrap();
    session.advance_clock().unwrap();
    assert!(started.elapsed() < Duration::from_secs(1));

    assert!(output(&session).contains("Now playing: Artist - Song a"));
    let state = session.store().snapshot();
    assert_eq!(state.current_time, 0.5);
    assert!(state.play_id.is_none());

    // The session attaches once the backend answers
    session.settle().await.unwrap();
    assert_eq!(
        session.store().snapshot().play_id,
        Some(PlayId::new("play-a"))
    );
}

#[tokio::test]
async fn unauthorized_stream_raises_alert() {
    let server = MockServer::start().await;
    mount_library(&server, 200).await;
    Mock::given(method("GET"))
        .and(path("/api/v1/play/a"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let mut session = session_for(&server);
    play_morning(&mut session).await;

    assert!(output(&session).contains("Log in to play \"Song a\""));
    assert!(!session.store().snapshot().is_playing);
}

#[tokio::test]
async fn failed_search_shows_no_results() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/search"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(serde_json::json!({ "error": "index down" })),
        )
        .mount(&server)
        .await;

    let mut session = session_for(&server);
    session
        .execute(Command::Search("daft punk".to_string()))
        .await
        .unwrap();

    assert!(output(&session).contains("No results for 'daft punk'"));
    assert!(matches!(
        session.execute(Command::Play(0)).await,
        Err(ConsoleError::Command(_))
    ));
}

#[tokio::test]
async fn search_results_can_be_enqueued() {
    let server = MockServer::start().await;
    mount_library(&server, 200).await;
    mount_streams(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/v1/search"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!([track_json("c", 120)])),
        )
        .mount(&server)
        .await;

    let mut session = session_for(&server);
    play_morning(&mut session).await;

    session
        .execute(Command::Search("song".to_string()))
        .await
        .unwrap();
    session.execute(Command::Add(0)).await.unwrap();

    let state = session.store().snapshot();
    let queued: Vec<&str> = state.queued_tracks.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(queued, vec!["b", "c"]);
}
