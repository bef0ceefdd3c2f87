/// A concrete category listing to paginate
///
/// One input category URL expands into either itself or one target per
/// discovered sub-category. Targets are immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTarget {
    /// Category URL given on the command line
    pub input_category_url: String,

    /// Listing URL actually paginated
    pub target_category_url: String,

    /// Breadcrumb-style labels leading to this category
    pub category_path: Vec<String>,

    /// Most specific label of the category, if known
    pub category_leaf: Option<String>,
}

impl CrawlTarget {
    /// Creates a target whose leaf is the last element of `category_path`
    pub fn new(input_category_url: &str, target_category_url: &str, category_path: Vec<String>) -> Self {
        let category_leaf = category_path.last().cloned();
        Self {
            input_category_url: input_category_url.to_string(),
            target_category_url: target_category_url.to_string(),
            category_path,
            category_leaf,
        }
    }

    /// The input category crawled as-is, with no known labels
    pub fn unlabeled(input_category_url: &str) -> Self {
        Self::new(input_category_url, input_category_url, Vec::new())
    }

    /// Replaces the leaf label
    pub fn with_leaf(mut self, leaf: Option<String>) -> Self {
        self.category_leaf = leaf;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaf_is_last_path_element() {
        let target = CrawlTarget::new(
            "https://shop.example.com/c/1",
            "https://shop.example.com/c/2",
            vec!["Women".to_string(), "Tops".to_string()],
        );
        assert_eq!(target.category_leaf.as_deref(), Some("Tops"));
    }

    #[test]
    fn test_unlabeled_target() {
        let target = CrawlTarget::unlabeled("https://shop.example.com/c/1");
        assert_eq!(target.target_category_url, target.input_category_url);
        assert!(target.category_path.is_empty());
        assert_eq!(target.category_leaf, None);
    }
}
