use anyhow::Result;

use newsrelay_core::storage::{Database, SourceRepository};

pub async fn run(db: &Database, id: i64) -> Result<()> {
    match SourceRepository::new(db).find_by_id(id).await? {
        Some(source) => {
            println!("Source {}", source.id);
            println!("  Name:  {}", source.name);
            println!("  URL:   {}", source.feed_url);
            println!("  Added: {}", source.created_at.format("%Y-%m-%d %H:%M"));
        }
        None => println!("Source {} not found.", id),
    }

    Ok(())
}
