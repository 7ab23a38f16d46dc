pub mod content;
pub mod likes;
pub mod memory;
pub mod playlists;

pub use content::{ContentRepository, PgContentRepository};
pub use likes::{LikeRepository, PgLikeRepository};
pub use memory::{MemoryContentRepository, MemoryLikeRepository, MemoryPlaylistRepository};
pub use playlists::{PgPlaylistRepository, PlaylistRepository};
