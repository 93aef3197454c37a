/// Catalogue filter, rendered into the backend's `search` query parameter.
///
/// Each non-empty facet becomes `name~*a,b*`; facets are comma-joined.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CourseSearch {
    pub categories: Vec<String>,
    pub levels: Vec<String>,
}

impl CourseSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.categories.push(category.into());
        self
    }

    pub fn level(mut self, level: impl Into<String>) -> Self {
        self.levels.push(level.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty() && self.levels.is_empty()
    }

    pub fn to_query(&self) -> String {
        let mut conditions = Vec::new();
        if !self.categories.is_empty() {
            conditions.push(format!("category~*{}*", self.categories.join(",")));
        }
        if !self.levels.is_empty() {
            conditions.push(format!("level~*{}*", self.levels.join(",")));
        }
        conditions.join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_facets_in_order() {
        let search = CourseSearch::new()
            .category("DevOps")
            .category("Business")
            .level("Beginner");
        assert_eq!(search.to_query(), "category~*DevOps,Business*,level~*Beginner*");
        assert_eq!(CourseSearch::new().to_query(), "");
    }
}
