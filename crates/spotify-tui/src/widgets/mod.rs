pub mod pane_chrome;
pub mod query_input;
pub mod status_bar;
pub mod table_surface;
