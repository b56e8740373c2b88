use crate::category::Category;

/// Version stamp of the compiled-in fallback taxonomy. Bumped whenever the
/// set below changes so sync summaries can report which version a tenant got.
pub const DEFAULT_TAXONOMY_VERSION: &str = "2024.1";

/// The fixed taxonomy used when a provider's category API is unavailable or
/// the provider is unconfigured. A tenant never ends up with zero categories.
///
/// These categories carry no `external_mappings` entry, which is how admin
/// tooling tells them apart from provider-sourced ones.
pub fn default_categories(tenant_id: &str) -> Vec<Category> {
    let mut categories = Vec::new();

    let electronics = Category::new(tenant_id, "Electronics");
    categories.push(Category::child_of(&electronics, "Phones & Accessories"));
    categories.push(Category::child_of(&electronics, "Computers"));
    categories.push(electronics);

    let fashion = Category::new(tenant_id, "Fashion");
    categories.push(Category::child_of(&fashion, "Men's Clothing"));
    categories.push(Category::child_of(&fashion, "Women's Clothing"));
    categories.push(fashion);

    categories.push(Category::new(tenant_id, "Home & Garden"));
    categories.push(Category::new(tenant_id, "Beauty & Health"));
    categories.push(Category::new(tenant_id, "Sports & Outdoors"));
    categories.push(Category::new(tenant_id, "Toys & Games"));

    categories
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_set_is_non_empty_and_deterministic() {
        let first = default_categories("t1");
        let second = default_categories("t1");

        assert!(!first.is_empty());
        let slugs: Vec<&str> = first.iter().map(|c| c.slug.as_str()).collect();
        let again: Vec<&str> = second.iter().map(|c| c.slug.as_str()).collect();
        assert_eq!(slugs, again);
    }

    #[test]
    fn test_defaults_are_not_provider_sourced() {
        for category in default_categories("t1") {
            assert!(!category.is_provider_sourced());
            assert!(category.is_active);
        }
    }

    #[test]
    fn test_children_are_linked() {
        let all = default_categories("t1");
        let phones = all.iter().find(|c| c.slug == "phones-accessories").unwrap();
        assert_eq!(phones.level, 1);
        assert_eq!(phones.path, "electronics/phones-accessories");
    }
}
