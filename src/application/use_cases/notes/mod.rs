pub mod get_backlinks;
pub mod get_note;
