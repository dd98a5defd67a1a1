use anyhow::Result;

use newsrelay_core::{
    feed::NewSource,
    storage::{Database, SourceRepository},
};

pub async fn run(db: &Database, name: &str, url: &str) -> Result<()> {
    let source = SourceRepository::new(db)
        .create(&NewSource {
            name: name.to_string(),
            feed_url: url.to_string(),
        })
        .await?;

    println!("Added source '{}' with id {}", source.name, source.id);
    Ok(())
}
