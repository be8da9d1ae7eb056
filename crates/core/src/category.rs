use serde::{Deserialize, Serialize};

/// Catch-all bucket for rows nothing else could classify.
pub const FALLBACK_CATEGORY: &str = "Otros";

/// A category known to the host application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub sub_categories: Vec<String>,
}

impl Category {
    pub fn new(id: &str, name: &str, sub_categories: &[&str]) -> Self {
        Category {
            id: id.to_string(),
            name: name.to_string(),
            sub_categories: sub_categories.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryMatch {
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_category: Option<String>,
}

impl CategoryMatch {
    pub fn new(category: impl Into<String>, sub_category: Option<String>) -> Self {
        CategoryMatch {
            category: category.into(),
            sub_category,
        }
    }

    pub fn fallback() -> Self {
        CategoryMatch::new(FALLBACK_CATEGORY, None)
    }
}
