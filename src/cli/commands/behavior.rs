//! Behavior command handlers

use anyhow::Context;

use crate::db::Store;
use crate::models::behavior::{
    BehaviorPatch, BehaviorRecord, DateRange, IncidentSearch, NewBehaviorRecord,
};

fn print_record(record: &BehaviorRecord) {
    println!(
        "[{}] {} {:<8} {:>+4}  {}",
        record.id,
        record.timestamp.format("%Y-%m-%d %H:%M"),
        record.behavior_type,
        record.points,
        record.description
    );
}

pub async fn cmd_behavior_record(store: &Store, new: NewBehaviorRecord) -> anyhow::Result<()> {
    let record = store
        .with_session(|session| async move { session.behaviors().record(new).await })
        .await
        .context("Failed to record behavior")?;

    println!("✓ Recorded behavior {}", record.id);
    print_record(&record);
    Ok(())
}

pub async fn cmd_behavior_list(
    store: &Store,
    student_id: i32,
    range: DateRange,
    json: bool,
) -> anyhow::Result<()> {
    let session = store.session();
    let records = session
        .behaviors()
        .list_for_student(student_id, range)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No behavior records for student {student_id}.");
        return Ok(());
    }

    println!("Behavior for student {student_id} ({} records)", records.len());
    println!("{:-<70}", "");
    for record in &records {
        print_record(record);
    }
    Ok(())
}

pub async fn cmd_behavior_points(
    store: &Store,
    student_id: i32,
    range: DateRange,
    json: bool,
) -> anyhow::Result<()> {
    let session = store.session();
    let summary = session.behaviors().summarize(student_id, range).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Student {student_id}: {} points", summary.total_points);
    println!(
        "  {} positive | {} negative | {} other",
        summary.positive, summary.negative, summary.other
    );
    Ok(())
}

pub async fn cmd_behavior_search(
    store: &Store,
    search: IncidentSearch,
    json: bool,
) -> anyhow::Result<()> {
    let session = store.session();
    let records = session.behaviors().search(&search).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No matching behavior records.");
        return Ok(());
    }

    println!("Matching behavior ({} shown)", records.len());
    println!("{:-<70}", "");
    for record in &records {
        println!("student {:>5}  recorded by {:>5}", record.student_id, record.recorded_by_id);
        print_record(record);
    }
    Ok(())
}

pub async fn cmd_behavior_update(
    store: &Store,
    record_id: i32,
    patch: BehaviorPatch,
) -> anyhow::Result<()> {
    if patch.is_noop() {
        println!("Nothing to update. Pass --description and/or --points.");
        return Ok(());
    }

    let updated = store
        .with_session(|session| async move { session.behaviors().update(record_id, patch).await })
        .await
        .context("Failed to update behavior record")?;

    match updated {
        Some(record) => {
            println!("✓ Updated behavior {record_id}");
            print_record(&record);
        }
        None => println!("Behavior record {record_id} not found"),
    }
    Ok(())
}
