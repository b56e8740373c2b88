/// Turn an arbitrary display name into a URL-safe slug.
///
/// Lowercases, keeps ASCII alphanumerics, and collapses every other run of
/// characters into a single dash. Leading/trailing dashes are trimmed so the
/// result is stable under re-slugging.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else if c == '\'' {
            // "Men's" → "mens", not "men-s".
            continue;
        } else {
            pending_dash = true;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_slug() {
        assert_eq!(slugify("Consumer Electronics"), "consumer-electronics");
        assert_eq!(slugify("Home & Garden"), "home-garden");
        assert_eq!(slugify("Men's Clothing"), "mens-clothing");
    }

    #[test]
    fn test_slug_is_stable() {
        let once = slugify("Sports / Outdoors!");
        assert_eq!(once, "sports-outdoors");
        assert_eq!(slugify(&once), once);
    }

    #[test]
    fn test_slug_trims_edges() {
        assert_eq!(slugify("  --Toys--  "), "toys");
        assert_eq!(slugify("***"), "");
    }
}
