use anyhow::Result;

use newsrelay_core::storage::{Database, SourceRepository};

pub async fn run(db: &Database, id: i64) -> Result<()> {
    if SourceRepository::new(db).delete(id).await? {
        println!("Deleted source {}. Its stored articles were kept.", id);
    } else {
        println!("Source {} not found.", id);
    }

    Ok(())
}
