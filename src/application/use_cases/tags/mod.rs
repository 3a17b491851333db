pub mod get_tag_page;
pub mod list_tags;
