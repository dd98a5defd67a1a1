use anyhow::Result;

use newsrelay_core::storage::{ArticleRepository, Database, SourceRepository};

pub async fn run(db: &Database) -> Result<()> {
    let sources = SourceRepository::new(db).list_all().await?;

    if sources.is_empty() {
        println!("No sources yet.");
        println!("\nTo add one, run:");
        println!("  newsrelay add-source --name <name> --url <feed url>");
        return Ok(());
    }

    println!("Sources ({}):\n", sources.len());

    for source in &sources {
        println!("  [{}] {}", source.id, source.name);
        println!("    URL: {}", source.feed_url);
        println!("    Added: {}", source.created_at.format("%Y-%m-%d %H:%M"));
        println!();
    }

    let pending = ArticleRepository::new(db).count_undelivered().await?;
    println!("Pending articles: {}", pending);

    Ok(())
}
