use super::models::Item;

/// Decide whether an item is excluded by the keyword list.
///
/// An item is skipped when any keyword occurs, ignoring case, in its title or
/// in one of its categories. An empty keyword list never skips.
pub fn should_skip(item: &Item, keywords: &[String]) -> bool {
    if keywords.is_empty() {
        return false;
    }

    let title = item.title.to_lowercase();
    let categories: Vec<String> = item.categories.iter().map(|c| c.to_lowercase()).collect();

    keywords.iter().any(|keyword| {
        let keyword = keyword.to_lowercase();
        if keyword.is_empty() {
            return false;
        }
        title.contains(&keyword) || categories.iter().any(|c| c.contains(&keyword))
    })
}
