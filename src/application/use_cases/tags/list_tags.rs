use crate::application::services::tagging::TagIndex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagCount {
    pub name: String,
    pub count: usize,
}

pub struct ListTags<'a> {
    pub tags: &'a TagIndex,
}

impl<'a> ListTags<'a> {
    /// Every tag with its note count; `filter` keeps tags containing it.
    pub fn execute(&self, filter: Option<&str>) -> Vec<TagCount> {
        self.tags
            .counts()
            .into_iter()
            .filter(|(name, _)| filter.is_none_or(|f| name.contains(f)))
            .map(|(name, count)| TagCount { name, count })
            .collect()
    }
}
