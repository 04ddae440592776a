//! services/reader_api/src/web/controller.rs
//!
//! The single writer of one reader's `ReaderState`.
//!
//! Every mutation arrives as a `Command` on one channel and is applied in order
//! by the controller task. Port calls run as spawned tasks that report back by
//! sending a command of their own, so no task other than the controller ever
//! touches the state. Observers follow it through a `watch` channel.

use crate::web::state::AppState;
use chrono::{Local, NaiveDate};
use quran_reader_core::cursor::{Annotation, Effect, LoadTicket, LoadedContent, NavigationData};
use quran_reader_core::debouncer::{ScrollCommand, ScrollCoordinator};
use quran_reader_core::domain::{ReadingProgress, VerseKey};
use quran_reader_core::ports::{AudioService, PortResult};
use quran_reader_core::{tasks, KhatamOverview, ReaderError, ReaderEvent, ReaderState};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

const COMMAND_BUFFER: usize = 256;

/// Everything the controller reacts to.
#[derive(Debug)]
pub enum Command {
    /// A reader intent.
    Event(ReaderEvent),
    Viewport { first: usize, last: usize },
    AnimationFinished,

    // --- Completions of spawned port calls ---
    Loaded {
        ticket: LoadTicket,
        result: PortResult<LoadedContent>,
    },
    Navigation {
        surah: u16,
        result: PortResult<NavigationData>,
    },
    Khatam(PortResult<KhatamOverview>),
    KhatamRecorded(PortResult<KhatamOverview>),
    ProgressPersisted(PortResult<ReadingProgress>),
    AnnotationSaved {
        verse: VerseKey,
        annotation: Annotation,
        result: PortResult<()>,
    },
    QuickJumpsChanged(PortResult<()>),
    DownloadProgress(f32),
    Downloaded {
        verse: VerseKey,
        result: PortResult<String>,
    },
    Played {
        verse: VerseKey,
        path: String,
        result: PortResult<()>,
    },
    Paused(PortResult<()>),
    Stopped(PortResult<()>),
}

/// One-off messages for the client that are not part of the state.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    ScrollTo(usize),
    Rejected(String),
}

/// The caller's side of a running controller. Dropping it stops the controller.
pub struct ReaderHandle {
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<ReaderState>,
    outbound: Option<mpsc::UnboundedReceiver<Outbound>>,
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ReaderHandle {
    pub async fn send(&self, command: Command) -> bool {
        self.commands.send(command).await.is_ok()
    }

    pub async fn event(&self, event: ReaderEvent) -> bool {
        self.send(Command::Event(event)).await
    }

    pub fn state(&self) -> watch::Receiver<ReaderState> {
        self.state.clone()
    }

    /// The stream of scroll commands and rejections. Can be taken once.
    pub fn take_outbound(&mut self) -> Option<mpsc::UnboundedReceiver<Outbound>> {
        self.outbound.take()
    }

    /// Stops the controller and waits until it has released its audio player.
    pub async fn shutdown(mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!("Reader controller ended abnormally: {:?}", e);
            }
        }
    }
}

impl Drop for ReaderHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

struct Controller {
    app: Arc<AppState>,
    audio: Arc<dyn AudioService>,
    state: ReaderState,
    scroll: ScrollCoordinator,
    publisher: watch::Sender<ReaderState>,
    outbound: mpsc::UnboundedSender<Outbound>,
    commands: mpsc::Sender<Command>,
}

/// Starts a controller. Its audio player is acquired here and released when
/// the controller stops.
pub fn spawn_controller(app: Arc<AppState>) -> ReaderHandle {
    let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let state = ReaderState::new(app.settings.verses_per_page);
    let (publisher, state_rx) = watch::channel(state.clone());
    let token = CancellationToken::new();

    let controller = Controller {
        audio: (app.audio)(),
        scroll: ScrollCoordinator::new(app.settings.settle),
        app,
        state,
        publisher,
        outbound: outbound_tx,
        commands: command_tx.clone(),
    };
    let task = tokio::spawn(controller.run(command_rx, token.clone()));

    ReaderHandle {
        commands: command_tx,
        state: state_rx,
        outbound: Some(outbound_rx),
        token,
        task: Some(task),
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

impl Controller {
    async fn run(mut self, mut commands: mpsc::Receiver<Command>, token: CancellationToken) {
        info!("Reader controller started.");
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                command = commands.recv() => match command {
                    Some(command) => {
                        self.apply(command);
                        self.publisher.send_replace(self.state.clone());
                    }
                    None => break,
                },
            }
        }
        self.audio.release().await;
        info!("Reader controller stopped.");
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::Event(event) => self.dispatch(event),
            Command::Viewport { first, last } => {
                if let Some(index) = self.scroll.observe_viewport(first, last, Instant::now()) {
                    self.dispatch(ReaderEvent::ScrollSettled(index));
                }
            }
            Command::AnimationFinished => self.scroll.animation_finished(Instant::now()),
            Command::Loaded { ticket, result } => match result {
                Ok(content) => match self.state.apply_loaded(ticket, content, today()) {
                    Ok(effects) => {
                        self.scroll.reset();
                        self.run_effects(effects);
                    }
                    Err(ReaderError::StaleLoad { .. }) => {}
                    Err(e) => error!("Load {} produced no content: {}", ticket.id, e),
                },
                Err(e) => {
                    error!("Failed to load {:?}: {}", ticket.target, e);
                    // A stale failure is dropped without touching the state.
                    let _ = self.state.apply_load_failed(ticket, e.to_string());
                }
            },
            Command::Navigation { surah, result } => match result {
                Ok(navigation) => self.state.apply_navigation(surah, navigation),
                Err(e) => self.fail("load navigation data", e),
            },
            Command::Khatam(result) => match result {
                Ok(overview) => self.state.apply_khatam(overview),
                Err(e) => self.fail("load the khatam session", e),
            },
            Command::KhatamRecorded(result) => match result {
                Ok(overview) => self.state.finish_khatam_update(Some(overview)),
                Err(e) => {
                    self.state.finish_khatam_update(None);
                    self.fail("record khatam progress", e);
                }
            },
            Command::ProgressPersisted(result) => match result {
                Ok(stored) => self.state.apply_stored_progress(stored),
                Err(e) => self.fail("save reading progress", e),
            },
            Command::AnnotationSaved {
                verse,
                annotation,
                result,
            } => match result {
                Ok(()) => self.state.apply_annotation(verse, &annotation),
                Err(e) => self.fail("save the annotation", e),
            },
            Command::QuickJumpsChanged(result) => match result {
                Ok(()) => {
                    if let Some(surah) = self.state.current_surah() {
                        self.run_effects(vec![Effect::RefreshNavigation { surah }]);
                    }
                }
                Err(e) => self.fail("update quick jumps", e),
            },
            Command::DownloadProgress(percent) => self.state.apply_download_progress(percent),
            Command::Downloaded { verse, result } => match result {
                Ok(path) => self.state.apply_download_complete(verse, path),
                Err(e) => {
                    error!("Failed to download audio: {}", e);
                    self.state.apply_download_failed(e.to_string());
                }
            },
            Command::Played { verse, path, result } => match result {
                Ok(()) => self.state.apply_playing(verse, path),
                Err(e) => self.fail("play audio", e),
            },
            Command::Paused(result) => match result {
                Ok(()) => self.state.apply_paused(),
                Err(e) => self.fail("pause audio", e),
            },
            Command::Stopped(result) => match result {
                Ok(()) => self.state.apply_stopped(),
                Err(e) => self.fail("stop audio", e),
            },
        }
    }

    fn dispatch(&mut self, event: ReaderEvent) {
        match self.state.handle(event, today()) {
            Ok(effects) => self.run_effects(effects),
            Err(e) => {
                debug!("Reader event rejected: {}", e);
                let _ = self.outbound.send(Outbound::Rejected(e.to_string()));
            }
        }
    }

    fn fail(&mut self, operation: &str, e: impl std::fmt::Display) {
        error!("Failed to {}: {}", operation, e);
        self.state.fail(format!("Failed to {operation}: {e}"));
    }

    /// Spawns `work` and feeds its outcome back as a command.
    fn spawn<F>(&self, work: F)
    where
        F: std::future::Future<Output = Command> + Send + 'static,
    {
        let commands = self.commands.clone();
        tokio::spawn(async move {
            let command = work.await;
            if commands.send(command).await.is_err() {
                debug!("Controller gone, dropping a completion");
            }
        });
    }

    fn run_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            self.run_effect(effect);
        }
    }

    fn run_effect(&mut self, effect: Effect) {
        let app = self.app.clone();
        match effect {
            Effect::Fetch(ticket) => self.spawn(async move {
                let result = tasks::load_content(app.verses.as_ref(), ticket.target).await;
                Command::Loaded { ticket, result }
            }),
            Effect::ScrollTo(index) => {
                let len = self.state.sequence().len();
                match self.scroll.request_scroll(index, len, Instant::now()) {
                    ScrollCommand::Animate(target) => {
                        let _ = self.outbound.send(Outbound::ScrollTo(target));
                    }
                    ScrollCommand::AlreadyVisible | ScrollCommand::Ignore => {}
                }
            }
            Effect::PersistProgress(progress) => self.spawn(async move {
                Command::ProgressPersisted(
                    tasks::persist_progress_forward(app.progress.as_ref(), progress).await,
                )
            }),
            Effect::RecordKhatam {
                session_id,
                surah,
                verse,
            } => self.spawn(async move {
                Command::KhatamRecorded(
                    tasks::record_khatam_progress(app.khatam.as_ref(), session_id, surah, verse, today())
                        .await,
                )
            }),
            Effect::RefreshNavigation { surah } => self.spawn(async move {
                let result = tasks::load_navigation(
                    app.annotations.as_ref(),
                    app.quick_jumps.as_ref(),
                    app.progress.as_ref(),
                    surah,
                )
                .await;
                Command::Navigation { surah, result }
            }),
            Effect::RefreshKhatam => self.spawn(async move {
                Command::Khatam(tasks::khatam_overview(app.khatam.as_ref(), today()).await)
            }),
            Effect::SaveAnnotation { verse, annotation } => self.spawn(async move {
                let result = match &annotation {
                    Annotation::Bookmark(on) => app.annotations.set_bookmark(verse, *on).await,
                    Annotation::Favorite(on) => app.annotations.set_favorite(verse, *on).await,
                    Annotation::Note(note) => app.annotations.set_note(verse, note).await,
                };
                Command::AnnotationSaved {
                    verse,
                    annotation,
                    result,
                }
            }),
            Effect::SaveQuickJump(quick_jump) => self.spawn(async move {
                Command::QuickJumpsChanged(app.quick_jumps.insert_quick_jump(quick_jump).await)
            }),
            Effect::DeleteQuickJump(id) => self.spawn(async move {
                Command::QuickJumpsChanged(app.quick_jumps.delete_quick_jump(id).await)
            }),
            Effect::DownloadAudio(verse) => {
                let audio = self.audio.clone();
                let commands = self.commands.clone();
                self.spawn(async move {
                    let report = move |percent: f32| {
                        // Progress is best effort; a full queue drops a tick.
                        let _ = commands.try_send(Command::DownloadProgress(percent));
                    };
                    let mut result = audio
                        .download(verse.surah, verse.number_in_surah, &report)
                        .await;
                    if let Ok(path) = &result {
                        if let Err(e) = app.annotations.set_audio_path(verse, path).await {
                            result = Err(e);
                        }
                    }
                    Command::Downloaded { verse, result }
                })
            }
            Effect::PlayAudio { verse, path } => {
                let audio = self.audio.clone();
                self.spawn(async move {
                    let result = audio.play(&path).await;
                    Command::Played {
                        verse,
                        path,
                        result,
                    }
                })
            }
            Effect::PauseAudio => {
                let audio = self.audio.clone();
                self.spawn(async move { Command::Paused(audio.pause().await) })
            }
            Effect::StopAudio => {
                let audio = self.audio.clone();
                self.spawn(async move { Command::Stopped(audio.stop().await) })
            }
        }
    }
}
