pub mod audio;
pub mod db;
pub mod memory;

pub use audio::LocalAudioAdapter;
pub use db::DbAdapter;
pub use memory::MemoryStore;
