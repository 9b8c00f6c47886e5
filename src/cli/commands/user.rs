//! User command handlers

use anyhow::Context;

use crate::db::Store;
use crate::models::user::{NewUser, User, UserPatch};

fn print_user(user: &User) {
    println!("[{}] {} <{}>", user.id, user.username, user.email);
    println!("  Name: {} | Role: {}", user.display_name(), user.role);
}

pub async fn cmd_user_add(store: &Store, new_user: NewUser) -> anyhow::Result<()> {
    let user = store
        .with_session(|session| async move { session.users().create(new_user).await })
        .await
        .context("Failed to create user")?;

    println!("✓ Created user {}", user.id);
    print_user(&user);
    Ok(())
}

pub async fn cmd_user_show(store: &Store, id: i32, json: bool) -> anyhow::Result<()> {
    let session = store.session();
    let Some(user) = session.users().get(id).await? else {
        println!("User {id} not found");
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&user)?);
    } else {
        print_user(&user);
    }
    Ok(())
}

pub async fn cmd_user_list(store: &Store, skip: u64, limit: u64, json: bool) -> anyhow::Result<()> {
    let session = store.session();
    let users = session.users().list(skip, limit).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&users)?);
        return Ok(());
    }

    if users.is_empty() {
        println!("No users found.");
        println!();
        println!("Add one with: conduct user add <username> <email> <role>");
        return Ok(());
    }

    println!("Users ({} shown)", users.len());
    println!("{:-<70}", "");
    for user in &users {
        println!(
            "{:>5}  {:<20} {:<12} {}",
            user.id,
            user.username,
            user.role,
            user.display_name()
        );
    }
    Ok(())
}

pub async fn cmd_user_update(store: &Store, id: i32, patch: UserPatch) -> anyhow::Result<()> {
    if patch.is_empty() {
        println!("Nothing to update. Pass at least one field flag.");
        return Ok(());
    }

    let updated = store
        .with_session(|session| async move { session.users().update(id, patch).await })
        .await
        .context("Failed to update user")?;

    match updated {
        Some(user) => {
            println!("✓ Updated user {id}");
            print_user(&user);
        }
        None => println!("User {id} not found"),
    }
    Ok(())
}

pub async fn cmd_user_remove(store: &Store, id: i32) -> anyhow::Result<()> {
    let removed = store
        .with_session(|session| async move { session.users().delete(id).await })
        .await?;

    if removed {
        println!("✓ Removed user {id}");
    } else {
        println!("User {id} not found");
    }
    Ok(())
}
