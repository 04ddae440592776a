//! services/reader_api/src/web/ws_handler.rs
//!
//! The entry point and control loop for one reader's WebSocket connection. Each
//! connection owns one controller; client messages become controller commands
//! and state changes are pushed back as server messages.

use crate::web::{
    controller::{spawn_controller, Command, Outbound},
    protocol::{ClientMessage, ServerMessage, StatusDto},
    state::AppState,
};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{
    stream::{SplitSink, StreamExt},
    SinkExt,
};
use quran_reader_core::{Anchor, LoadTarget, ReaderEvent, ReaderState};
use std::sync::Arc;
use tracing::{error, info, warn};

/// The handler for upgrading HTTP requests to WebSocket connections.
pub async fn ws_handler(ws: WebSocketUpgrade, State(app_state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state))
}

/// Maps a client message onto the controller command it stands for.
pub fn to_command(message: ClientMessage) -> Command {
    let event = match message {
        ClientMessage::ViewportChanged { first, last } => return Command::Viewport { first, last },
        ClientMessage::ScrollAnimationFinished => return Command::AnimationFinished,
        ClientMessage::LoadSurah { surah, verse } => ReaderEvent::Load {
            target: LoadTarget::Surah(surah),
            anchor: verse.map(Anchor::Verse).unwrap_or_default(),
        },
        ClientMessage::LoadJuz { juz } => ReaderEvent::Load {
            target: LoadTarget::Juz(juz),
            anchor: Anchor::Start,
        },
        ClientMessage::JumpToVerse { verse } => ReaderEvent::JumpToVerse(verse),
        ClientMessage::NavigateNext => ReaderEvent::NavigateNext,
        ClientMessage::NavigatePrevious => ReaderEvent::NavigatePrevious,
        ClientMessage::NextPage => ReaderEvent::NextPage,
        ClientMessage::PreviousPage => ReaderEvent::PreviousPage,
        ClientMessage::JumpToPage { page } => ReaderEvent::JumpToPage(page),
        ClientMessage::SetPagination { enabled } => ReaderEvent::SetPagination(enabled),
        ClientMessage::UpdateReadingProgress { verse } => ReaderEvent::UpdateReadingProgress(verse),
        ClientMessage::ToggleBookmark { verse } => ReaderEvent::ToggleBookmark(verse.into()),
        ClientMessage::ToggleFavorite { verse } => ReaderEvent::ToggleFavorite(verse.into()),
        ClientMessage::UpdateNote { verse, note } => ReaderEvent::UpdateNote {
            verse: verse.into(),
            note,
        },
        ClientMessage::SelectVerse { verse } => ReaderEvent::SelectVerse(verse.into()),
        ClientMessage::ToggleNavigationPanel => ReaderEvent::ToggleNavigationPanel,
        ClientMessage::ClearError => ReaderEvent::ClearError,
        ClientMessage::AddQuickJump { name } => ReaderEvent::AddQuickJump(name),
        ClientMessage::DeleteQuickJump { id } => ReaderEvent::DeleteQuickJump(id),
        ClientMessage::OpenQuickJump { id } => ReaderEvent::OpenQuickJump(id),
        ClientMessage::DownloadAudio { verse } => ReaderEvent::DownloadAudio(verse.into()),
        ClientMessage::PlayAudio { verse } => ReaderEvent::PlayAudio(verse.into()),
        ClientMessage::PauseAudio => ReaderEvent::PauseAudio,
        ClientMessage::StopAudio => ReaderEvent::StopAudio,
        ClientMessage::UpdateKhatamProgress { surah, verse } => {
            ReaderEvent::UpdateKhatamProgress { surah, verse }
        }
    };
    Command::Event(event)
}

type WsSender = SplitSink<WebSocket, Message>;

async fn send_message(sender: &mut WsSender, message: &ServerMessage) -> bool {
    match serde_json::to_string(message) {
        Ok(json) => sender.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            error!("Failed to serialize server message: {}", e);
            true
        }
    }
}

/// Pushes the messages a state change calls for. Returns false once the client is gone.
async fn push_state(sender: &mut WsSender, state: &ReaderState, sent_revision: &mut u64) -> bool {
    if state.content_revision != *sent_revision {
        *sent_revision = state.content_revision;
        if !send_message(sender, &ServerMessage::sequence(state)).await {
            return false;
        }
    }
    if !send_message(sender, &ServerMessage::Status(StatusDto::from(state))).await {
        return false;
    }
    if state.pagination.enabled && state.is_loaded() {
        return send_message(sender, &ServerMessage::page(state)).await;
    }
    true
}

async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>) {
    info!("New reader connection established.");

    let (mut sender, mut receiver) = socket.split();
    let mut handle = spawn_controller(app_state);
    let mut state_rx = handle.state();
    let Some(mut outbound) = handle.take_outbound() else {
        error!("Controller outbound stream already taken.");
        return;
    };
    let mut sent_revision = 0;

    // --- Main Message Loop ---
    loop {
        tokio::select! {
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Text(text))) => match serde_json::from_str::<ClientMessage>(text.as_str()) {
                    Ok(message) => {
                        if !handle.send(to_command(message)).await {
                            error!("Reader controller is no longer running.");
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("Failed to deserialize client message: {}", e);
                        let reply = ServerMessage::Error {
                            message: format!("Unrecognised message: {e}"),
                        };
                        if !send_message(&mut sender, &reply).await {
                            break;
                        }
                    }
                },
                Some(Ok(Message::Close(_))) => {
                    info!("Client sent close message.");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("WebSocket receive failed: {}", e);
                    break;
                }
                None => {
                    info!("Client disconnected.");
                    break;
                }
            },
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = state_rx.borrow_and_update().clone();
                if !push_state(&mut sender, &state, &mut sent_revision).await {
                    break;
                }
            },
            Some(message) = outbound.recv() => {
                let reply = match message {
                    Outbound::ScrollTo(index) => ServerMessage::ScrollTo { index },
                    Outbound::Rejected(message) => ServerMessage::Error { message },
                };
                if !send_message(&mut sender, &reply).await {
                    break;
                }
            },
        }
    }

    // --- Cleanup ---
    handle.shutdown().await;
    info!("Reader connection closed.");
}
