pub mod errors;
pub mod note;
