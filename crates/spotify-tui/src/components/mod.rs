pub mod album_list;
pub mod devices;
pub mod playback_panel;
pub mod search_panel;

pub use album_list::AlbumList;
pub use devices::Devices;
pub use playback_panel::PlaybackPanel;
pub use search_panel::{ResultKind, ResultsTable, SearchInput};
