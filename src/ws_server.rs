// WebSocket request layer over the draft engine.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio_tungstenite::tungstenite::Message;
use tracing::{info, warn};

use crate::engine::DraftEngine;
use crate::error::ErrorKind;
use crate::notify::{ChangeEvent, ChannelNotifier};
use crate::protocol::{ClientCommand, ServerMessage};

/// Run the WebSocket server on `127.0.0.1:{port}`.
///
/// Each accepted connection gets its own task plus its own subscription to
/// the notification feed, so every client sees every committed state change
/// regardless of who triggered it. The server runs until the task is
/// cancelled or the process exits.
pub async fn run(
    port: u16,
    engine: Arc<DraftEngine>,
    notifier: Arc<ChannelNotifier>,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(format!("127.0.0.1:{port}")).await?;
    let local_addr = listener.local_addr()?;
    info!("WebSocket server listening on {local_addr}");

    loop {
        let (stream, addr) = listener.accept().await?;
        let addr_str = addr.to_string();
        info!("Accepted TCP connection from {addr_str}");

        let engine = engine.clone();
        let updates = notifier.subscribe();
        tokio::spawn(async move {
            if let Err(e) = serve_connection(stream, &addr_str, engine, updates).await {
                warn!("connection {addr_str} ended with error: {e}");
            }
        });
    }
}

/// Drive one client: answer its commands and forward the update feed.
async fn serve_connection(
    stream: TcpStream,
    addr: &str,
    engine: Arc<DraftEngine>,
    mut updates: broadcast::Receiver<String>,
) -> anyhow::Result<()> {
    let ws_stream = tokio_tungstenite::accept_async(stream).await?;
    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Ok(payload) => {
                    if let Ok(event) = serde_json::from_str::<ChangeEvent>(&payload) {
                        let msg = ServerMessage::Update {
                            league_id: event.league_id,
                            change: event.change,
                        };
                        write.send(Message::Text(serde_json::to_string(&msg)?.into())).await?;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("client {addr} lagged, dropped {skipped} updates");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            msg = read.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    let reply = handle_message(&engine, &text).await;
                    write.send(Message::Text(serde_json::to_string(&reply)?.into())).await?;
                }
                Some(Ok(Message::Close(_))) => {
                    info!("Client {addr} sent close frame");
                    break;
                }
                Some(Ok(_)) => {
                    // Ignore Binary, Ping, Pong, Frame variants.
                }
                Some(Err(e)) => {
                    warn!("WebSocket error from {addr}: {e}");
                    break;
                }
                None => break,
            }
        }
    }

    Ok(())
}

/// Parse a raw text frame and dispatch it. Malformed frames get an error
/// reply instead of killing the connection.
pub async fn handle_message(engine: &DraftEngine, text: &str) -> ServerMessage {
    match serde_json::from_str::<ClientCommand>(text) {
        Ok(cmd) => dispatch(engine, cmd).await,
        Err(e) => ServerMessage::Error {
            kind: ErrorKind::InvalidState,
            message: format!("malformed command: {e}"),
        },
    }
}

/// Route one command to the engine and shape the reply.
pub async fn dispatch(engine: &DraftEngine, cmd: ClientCommand) -> ServerMessage {
    let result = match cmd {
        ClientCommand::CreateLeague {
            name,
            user_id,
            max_teams,
        } => engine
            .create_league(&name, &user_id, max_teams)
            .await
            .map(|league| ServerMessage::League { league }),
        ClientCommand::JoinDraft {
            league_id,
            user_id,
            team_name,
        } => engine
            .join_draft(&league_id, &user_id, team_name.as_deref())
            .await
            .map(|team| ServerMessage::Team { team }),
        ClientCommand::StartDraft { league_id, user_id } => {
            match engine.start_draft(&league_id, &user_id).await {
                Ok(_) => engine
                    .room_state(&league_id)
                    .await
                    .map(|room| ServerMessage::Room { room }),
                Err(e) => Err(e),
            }
        }
        ClientCommand::PickPlayer {
            league_id,
            team_id,
            user_id,
            player,
        } => engine
            .pick_player(&league_id, &team_id, player, &user_id)
            .await
            .map(|outcome| ServerMessage::PickMade {
                pick: outcome.pick,
                next_team: outcome.next_team,
            }),
        ClientCommand::PauseDraft { league_id, user_id } => engine
            .pause_draft(&league_id, &user_id)
            .await
            .map(|()| ServerMessage::Ack),
        ClientCommand::ResumeDraft { league_id, user_id } => engine
            .resume_draft(&league_id, &user_id)
            .await
            .map(|()| ServerMessage::Ack),
        ClientCommand::GetRoom { league_id } => engine
            .room_state(&league_id)
            .await
            .map(|room| ServerMessage::Room { room }),
        ClientCommand::GetLeague { league_id } => engine
            .league_info(&league_id)
            .await
            .map(|league| ServerMessage::League { league }),
        ClientCommand::GetDraftedPlayers { league_id } => {
            engine.drafted_player_ids(&league_id).await.map(|ids| {
                let mut player_ids: Vec<i64> = ids.into_iter().collect();
                player_ids.sort_unstable();
                ServerMessage::DraftedPlayers { player_ids }
            })
        }
        ClientCommand::GetMyTeam { league_id, user_id } => engine
            .my_team(&league_id, &user_id)
            .await
            .map(|team| ServerMessage::Team { team }),
    };

    result.unwrap_or_else(|e| ServerMessage::error(&e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::draft::pick::PlayerRef;
    use crate::engine::DraftSettings;
    use crate::notify::NullNotifier;

    fn engine() -> DraftEngine {
        let storage = Arc::new(Database::open(":memory:").unwrap());
        DraftEngine::new(
            storage,
            Arc::new(NullNotifier),
            DraftSettings {
                total_rounds: 1,
                seconds_per_pick: 90,
                default_max_teams: 4,
            },
        )
    }

    async fn seeded_league(engine: &DraftEngine) -> String {
        let league = match dispatch(
            engine,
            ClientCommand::CreateLeague {
                name: "Test League".into(),
                user_id: "user1".into(),
                max_teams: Some(4),
            },
        )
        .await
        {
            ServerMessage::League { league } => league,
            other => panic!("unexpected reply: {other:?}"),
        };
        for user in ["user1", "user2"] {
            dispatch(
                engine,
                ClientCommand::JoinDraft {
                    league_id: league.id.clone(),
                    user_id: user.into(),
                    team_name: None,
                },
            )
            .await;
        }
        league.id
    }

    #[tokio::test]
    async fn full_command_lifecycle() {
        let engine = engine();
        let league_id = seeded_league(&engine).await;

        let reply = dispatch(
            &engine,
            ClientCommand::StartDraft {
                league_id: league_id.clone(),
                user_id: "user1".into(),
            },
        )
        .await;
        let ServerMessage::Room { room } = reply else {
            panic!("expected room reply");
        };
        assert_eq!(room.current_round, 1);
        assert_eq!(room.current_team.as_ref().unwrap().id, "team1");

        let reply = dispatch(
            &engine,
            ClientCommand::PickPlayer {
                league_id: league_id.clone(),
                team_id: "team1".into(),
                user_id: "user1".into(),
                player: PlayerRef::new(101, "Nikola Jokic", "DEN", "C"),
            },
        )
        .await;
        let ServerMessage::PickMade { pick, next_team } = reply else {
            panic!("expected pick reply");
        };
        assert_eq!(pick.overall, 1);
        assert_eq!(next_team.unwrap().id, "team2");

        let reply = dispatch(
            &engine,
            ClientCommand::GetDraftedPlayers {
                league_id: league_id.clone(),
            },
        )
        .await;
        let ServerMessage::DraftedPlayers { player_ids } = reply else {
            panic!("expected drafted players reply");
        };
        assert_eq!(player_ids, vec![101]);
    }

    #[tokio::test]
    async fn engine_errors_become_error_replies() {
        let engine = engine();
        let league_id = seeded_league(&engine).await;

        let reply = dispatch(
            &engine,
            ClientCommand::StartDraft {
                league_id: league_id.clone(),
                user_id: "user2".into(),
            },
        )
        .await;
        let ServerMessage::Error { kind, message } = reply else {
            panic!("expected error reply");
        };
        assert_eq!(kind, ErrorKind::Forbidden);
        assert!(message.contains("commissioner"));
    }

    #[tokio::test]
    async fn malformed_frames_get_error_replies() {
        let engine = engine();
        let reply = handle_message(&engine, "{not json").await;
        assert!(matches!(reply, ServerMessage::Error { .. }));

        let reply = handle_message(&engine, r#"{"type":"warp_drive"}"#).await;
        assert!(matches!(reply, ServerMessage::Error { .. }));
    }

    #[tokio::test]
    async fn get_room_before_start_is_not_found() {
        let engine = engine();
        let league_id = seeded_league(&engine).await;
        let reply = dispatch(&engine, ClientCommand::GetRoom { league_id }).await;
        let ServerMessage::Error { kind, .. } = reply else {
            panic!("expected error reply");
        };
        assert_eq!(kind, ErrorKind::NotFound);
    }
}
