pub mod compositor;
pub mod cursor;
pub mod debouncer;
pub mod domain;
pub mod error;
pub mod khatam;
pub mod ports;
pub mod sequence;
pub mod tasks;

pub use cursor::{
    Anchor, Annotation, Effect, LoadTarget, LoadTicket, LoadedContent, NavigationData,
    ReaderEvent, ReaderSettings, ReaderState,
};
pub use debouncer::{ScrollCommand, ScrollCoordinator};
pub use domain::{
    AudioState, JuzMeta, KhatamProgressEntry, KhatamSession, QuickJump, ReadingProgress,
    SequenceItem, StructuralHeader, SurahMeta, Verse, VerseKey,
};
pub use error::ReaderError;
pub use khatam::KhatamOverview;
pub use ports::{
    AnnotationStore, AudioService, KhatamStore, PortError, PortResult, QuickJumpStore,
    ReadingProgressStore, VerseStore,
};
