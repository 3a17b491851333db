pub mod indexing;
pub mod markdown;
pub mod publish;
pub mod render_cache;
pub mod tagging;
pub mod template;
