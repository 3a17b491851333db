pub mod note_store;
