use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vendra_shared::slugify;

/// A tenant-scoped node in the category tree.
///
/// `path` and `breadcrumbs` are materialized from the `parent_id` chain and
/// must be recomputed whenever the parent changes; see `rebuild_hierarchy`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub tenant_id: String,
    pub name: String,
    pub slug: String,
    pub parent_id: Option<Uuid>,
    pub level: i32,
    /// Slash-joined slug path from the root, e.g. "fashion/mens-clothing".
    pub path: String,
    /// Ancestor names root-first, ending with this category's own name.
    pub breadcrumbs: Vec<String>,
    pub is_active: bool,
    pub is_featured: bool,
    /// Denormalized count of active products with this category's slug.
    pub product_count: i64,
    /// Provider name → provider-native category id. Empty for categories
    /// that came from the fallback taxonomy rather than a provider.
    pub external_mappings: HashMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    /// Create a root category.
    pub fn new(tenant_id: impl Into<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        let slug = slugify(&name);
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            tenant_id: tenant_id.into(),
            slug: slug.clone(),
            path: slug,
            breadcrumbs: vec![name.clone()],
            name,
            parent_id: None,
            level: 0,
            is_active: true,
            is_featured: false,
            product_count: 0,
            external_mappings: HashMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a child of `parent`, deriving level, path and breadcrumbs.
    pub fn child_of(parent: &Category, name: impl Into<String>) -> Self {
        let mut category = Self::new(parent.tenant_id.clone(), name);
        category.parent_id = Some(parent.id);
        category.level = parent.level + 1;
        category.path = format!("{}/{}", parent.path, category.slug);
        let mut breadcrumbs = parent.breadcrumbs.clone();
        breadcrumbs.push(category.name.clone());
        category.breadcrumbs = breadcrumbs;
        category
    }

    pub fn with_external_mapping(
        mut self,
        provider: impl Into<String>,
        external_id: impl Into<String>,
    ) -> Self {
        self.external_mappings
            .insert(provider.into(), external_id.into());
        self
    }

    /// Provider-sourced categories carry at least one external mapping;
    /// fallback-taxonomy categories never do.
    pub fn is_provider_sourced(&self) -> bool {
        !self.external_mappings.is_empty()
    }
}

/// Recompute `level`, `path` and `breadcrumbs` for every category from its
/// `parent_id` chain within the given set. Parents missing from the set are
/// treated as absent (the category becomes a root); cycles are cut off
/// rather than looped on.
pub fn rebuild_hierarchy(categories: &mut [Category]) {
    let index: HashMap<Uuid, (String, String, Option<Uuid>)> = categories
        .iter()
        .map(|c| (c.id, (c.slug.clone(), c.name.clone(), c.parent_id)))
        .collect();

    for category in categories.iter_mut() {
        let mut slugs = vec![category.slug.clone()];
        let mut names = vec![category.name.clone()];
        let mut cursor = category.parent_id;
        let mut hops = 0;

        while let Some(parent_id) = cursor {
            hops += 1;
            if hops > 64 {
                tracing::warn!(
                    "Category {} has a cyclic or overly deep parent chain; truncating",
                    category.slug
                );
                break;
            }
            match index.get(&parent_id) {
                Some((slug, name, grandparent)) => {
                    slugs.push(slug.clone());
                    names.push(name.clone());
                    cursor = *grandparent;
                }
                None => break,
            }
        }

        slugs.reverse();
        names.reverse();
        category.level = (slugs.len() - 1) as i32;
        category.path = slugs.join("/");
        category.breadcrumbs = names;
        category.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_derives_hierarchy_fields() {
        let root = Category::new("t1", "Fashion");
        let child = Category::child_of(&root, "Men's Clothing");

        assert_eq!(child.level, 1);
        assert_eq!(child.path, "fashion/mens-clothing");
        assert_eq!(
            child.breadcrumbs,
            vec!["Fashion".to_string(), "Men's Clothing".to_string()]
        );
        assert_eq!(child.parent_id, Some(root.id));
    }

    #[test]
    fn test_rebuild_hierarchy_after_reparenting() {
        let root = Category::new("t1", "Electronics");
        let other_root = Category::new("t1", "Outlet");
        let mut child = Category::child_of(&root, "Phones");

        // Move the child under the other root without touching path fields.
        child.parent_id = Some(other_root.id);

        let mut all = vec![root, other_root, child];
        rebuild_hierarchy(&mut all);

        let child = all.iter().find(|c| c.slug == "phones").unwrap();
        assert_eq!(child.level, 1);
        assert_eq!(child.path, "outlet/phones");
        assert_eq!(
            child.breadcrumbs,
            vec!["Outlet".to_string(), "Phones".to_string()]
        );
    }

    #[test]
    fn test_rebuild_treats_missing_parent_as_root() {
        let mut orphan = Category::new("t1", "Ghost Child");
        orphan.parent_id = Some(Uuid::new_v4());

        let mut all = vec![orphan];
        rebuild_hierarchy(&mut all);

        assert_eq!(all[0].level, 0);
        assert_eq!(all[0].path, "ghost-child");
    }
}
