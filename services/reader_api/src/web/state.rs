//! services/reader_api/src/web/state.rs
//!
//! Defines the application's shared state.

use quran_reader_core::ports::{
    AnnotationStore, AudioService, KhatamStore, QuickJumpStore, ReadingProgressStore, VerseStore,
};
use quran_reader_core::ReaderSettings;
use std::sync::Arc;

/// Builds the audio player owned by one controller.
pub type AudioFactory = Arc<dyn Fn() -> Arc<dyn AudioService> + Send + Sync>;

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub verses: Arc<dyn VerseStore>,
    pub annotations: Arc<dyn AnnotationStore>,
    pub progress: Arc<dyn ReadingProgressStore>,
    pub khatam: Arc<dyn KhatamStore>,
    pub quick_jumps: Arc<dyn QuickJumpStore>,
    pub audio: AudioFactory,
    pub settings: ReaderSettings,
}

impl AppState {
    /// Wires every storage port to the same adapter.
    pub fn from_store<S>(store: Arc<S>, audio: AudioFactory, settings: ReaderSettings) -> Self
    where
        S: VerseStore
            + AnnotationStore
            + ReadingProgressStore
            + KhatamStore
            + QuickJumpStore
            + 'static,
    {
        Self {
            verses: store.clone(),
            annotations: store.clone(),
            progress: store.clone(),
            khatam: store.clone(),
            quick_jumps: store,
            audio,
            settings,
        }
    }
}
