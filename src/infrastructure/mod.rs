pub mod crypto;
pub mod dropbox;
pub mod storage;
