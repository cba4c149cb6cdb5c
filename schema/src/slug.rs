/// Lowercase ASCII alphanumerics of `title`, runs of anything else collapsed
/// to a single hyphen. Falls back to `property` when nothing survives.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str("property");
    }
    slug
}

/// Unique slug of a stored listing.
pub fn listing_slug(title: &str, id: i64) -> String {
    format!("{}-{}", slugify(title), id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_separators() {
        assert_eq!(slugify("  Sunny 3BR -- flat, Maadi! "), "sunny-3br-flat-maadi");
    }

    #[test]
    fn non_ascii_title_falls_back() {
        assert_eq!(slugify("شقة للبيع"), "property");
        assert_eq!(listing_slug("شقة للبيع", 12), "property-12");
    }
}
