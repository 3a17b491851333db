pub mod filesystem;
#[cfg(test)]
pub mod memory;

pub use filesystem::FsNoteStore;
