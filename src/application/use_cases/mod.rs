pub mod notes;
pub mod sync;
pub mod tags;
