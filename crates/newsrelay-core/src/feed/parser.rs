use chrono::{DateTime, Utc};
use feed_rs::parser;

use super::models::Item;
use crate::{Error, Result};

/// Parse RSS/Atom/JSON feed content into items tagged with the source name.
///
/// Entries without a link are dropped: the link is the article's identity
/// within a source. Entries without a date are stamped with `fetched_at`.
pub fn parse_items(
    content: &[u8],
    source_name: &str,
    fetched_at: DateTime<Utc>,
) -> Result<Vec<Item>> {
    let feed = parser::parse(content)
        .map_err(|e| Error::FeedParse(e.to_string()))?;

    let items = feed
        .entries
        .into_iter()
        .filter_map(|entry| {
            let link = entry.links.first().map(|l| l.href.trim().to_string())?;
            if link.is_empty() {
                return None;
            }

            let title = entry
                .title
                .map(|t| t.content.trim().to_string())
                .unwrap_or_default();

            let categories = entry
                .categories
                .into_iter()
                .map(|c| c.label.unwrap_or(c.term))
                .collect();

            let summary = entry
                .summary
                .map(|s| s.content)
                .filter(|s| !s.trim().is_empty());

            let published_at = entry
                .published
                .or(entry.updated)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or(fetched_at);

            Some(Item {
                title,
                categories,
                link,
                published_at,
                summary,
                source_name: source_name.to_string(),
            })
        })
        .collect();

    Ok(items)
}
