//! Status command handler

use crate::config::Config;
use crate::db::Store;

pub async fn cmd_status(config: &Config, store: &Store) -> anyhow::Result<()> {
    store.ping().await?;

    let session = store.session();
    let users = session.users().count().await?;

    println!("Database:  {} (ok)", config.database.url);
    println!("Users:     {users}");
    println!("On delete: {}", config.users.on_delete);
    println!(
        "Rules:     types {} | point sign {}",
        if config.behavior.enforce_types { "enforced" } else { "free" },
        if config.behavior.enforce_point_sign { "enforced" } else { "free" },
    );

    Ok(())
}
