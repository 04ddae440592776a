pub mod controller;
pub mod protocol;
pub mod rest;
pub mod state;
pub mod ws_handler;

// Re-export the handlers the binary mounts on the router.
pub use rest::{active_khatam_handler, list_progress_handler, surah_progress_handler};
pub use ws_handler::ws_handler;
