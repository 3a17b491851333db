mod client;

pub use client::{DropboxConfig, DropboxNoteStore};

pub const DEFAULT_API_URL: &str = "https://api.dropboxapi.com";
pub const DEFAULT_CONTENT_URL: &str = "https://content.dropboxapi.com";
