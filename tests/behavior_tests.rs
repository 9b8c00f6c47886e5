//! Integration tests for behavior record operations.

mod common;

use common::{at, spawn_store, spawn_store_with};
use conduct::domain::{BehaviorError, BehaviorRules, DeletePolicy, UserError};
use conduct::models::behavior::{BehaviorPatch, DateRange, IncidentSearch, NewBehaviorRecord};
use conduct::models::user::NewUser;
use conduct::{Session, Store};

/// Creates student 1 and recorder 2.
async fn seed_users(session: &Session) {
    let users = session.users();
    users
        .create(NewUser::new("sam", "sam@school.test", "student"))
        .await
        .unwrap();
    users
        .create(NewUser::new("tess", "tess@school.test", "teacher"))
        .await
        .unwrap();
}

#[tokio::test]
async fn record_list_and_sum_scenario() {
    let db = spawn_store().await;
    let session = db.store.session();
    seed_users(&session).await;
    let behaviors = session.behaviors();

    let first = behaviors
        .record(NewBehaviorRecord::new(1, 2, "positive", "Helped classmate", 5))
        .await
        .unwrap();

    let listed = behaviors.list_for_student(1, DateRange::all()).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0], first);
    assert_eq!(listed[0].points, 5);
    assert_eq!(listed[0].behavior_type, "positive");
    assert_eq!(listed[0].description, "Helped classmate");
    assert_eq!(listed[0].recorded_by_id, 2);

    behaviors
        .record(NewBehaviorRecord::new(1, 2, "negative", "Late", -2))
        .await
        .unwrap();

    assert_eq!(behaviors.sum_points(1, DateRange::all()).await.unwrap(), 3);
}

#[tokio::test]
async fn record_defaults_timestamp_to_now() {
    let db = spawn_store().await;
    let session = db.store.session();
    seed_users(&session).await;

    let before = chrono::Utc::now();
    let record = session
        .behaviors()
        .record(NewBehaviorRecord::new(1, 2, "positive", "On time", 1))
        .await
        .unwrap();
    let after = chrono::Utc::now();

    assert!(record.timestamp >= before && record.timestamp <= after);
    assert_eq!(record.created_at, record.updated_at);
}

#[tokio::test]
async fn no_records_means_empty_list_and_zero_sum() {
    let db = spawn_store().await;
    let session = db.store.session();
    let behaviors = session.behaviors();

    assert!(behaviors.list_for_student(1, DateRange::all()).await.unwrap().is_empty());
    assert_eq!(behaviors.sum_points(1, DateRange::all()).await.unwrap(), 0);
    assert_eq!(
        behaviors.sum_points(1, DateRange::since(at(1, 0))).await.unwrap(),
        0
    );
}

#[tokio::test]
async fn list_is_newest_first_and_scoped_to_student() {
    let db = spawn_store().await;
    let session = db.store.session();
    seed_users(&session).await;
    let behaviors = session.behaviors();

    for (day, points) in [(3, 1), (1, 2), (5, 3)] {
        behaviors
            .record(NewBehaviorRecord::new(1, 2, "positive", "Participation", points).at(at(day, 9)))
            .await
            .unwrap();
    }
    // Recorder 2 as a subject of their own record must not leak into student 1.
    behaviors
        .record(NewBehaviorRecord::new(2, 1, "negative", "Other student", -9))
        .await
        .unwrap();

    let listed = behaviors.list_for_student(1, DateRange::all()).await.unwrap();
    let days: Vec<_> = listed.iter().map(|r| r.timestamp).collect();
    assert_eq!(days, vec![at(5, 9), at(3, 9), at(1, 9)]);
}

#[tokio::test]
async fn date_filters_are_inclusive_and_match_sum() {
    let db = spawn_store().await;
    let session = db.store.session();
    seed_users(&session).await;
    let behaviors = session.behaviors();

    for (day, points) in [(1, 10), (2, 20), (3, -5), (4, 40)] {
        behaviors
            .record(NewBehaviorRecord::new(1, 2, "positive", "Work", points).at(at(day, 12)))
            .await
            .unwrap();
    }

    let ranges = [
        (DateRange::all(), 4, 65),
        (DateRange::since(at(2, 12)), 3, 55),
        (DateRange::until(at(2, 12)), 2, 30),
        (DateRange::between(at(2, 12), at(3, 12)), 2, 15),
        (DateRange::between(at(2, 13), at(3, 11)), 0, 0),
    ];

    for (range, expected_len, expected_sum) in ranges {
        let listed = behaviors.list_for_student(1, range).await.unwrap();
        assert_eq!(listed.len(), expected_len, "{range:?}");
        assert!(listed.iter().all(|r| range.contains(r.timestamp)));

        let listed_sum: i64 = listed.iter().map(|r| i64::from(r.points)).sum();
        let sum = behaviors.sum_points(1, range).await.unwrap();
        assert_eq!(sum, listed_sum);
        assert_eq!(sum, expected_sum);
    }
}

#[tokio::test]
async fn summarize_uses_same_filter() {
    let db = spawn_store().await;
    let session = db.store.session();
    seed_users(&session).await;
    let behaviors = session.behaviors();

    behaviors
        .record(NewBehaviorRecord::new(1, 2, "positive", "Helped", 5).at(at(1, 8)))
        .await
        .unwrap();
    behaviors
        .record(NewBehaviorRecord::new(1, 2, "negative", "Late", -2).at(at(2, 8)))
        .await
        .unwrap();
    behaviors
        .record(NewBehaviorRecord::new(1, 2, "note", "Parent call", 0).at(at(9, 8)))
        .await
        .unwrap();

    let summary = behaviors
        .summarize(1, DateRange::until(at(5, 0)))
        .await
        .unwrap();
    assert_eq!(summary.positive, 1);
    assert_eq!(summary.negative, 1);
    assert_eq!(summary.other, 0);
    assert_eq!(summary.total_points, 3);
}

#[tokio::test]
async fn empty_description_is_rejected() {
    let db = spawn_store().await;
    let session = db.store.session();
    seed_users(&session).await;

    let err = session
        .behaviors()
        .record(NewBehaviorRecord::new(1, 2, "positive", "   ", 1))
        .await
        .unwrap_err();
    assert!(matches!(err, BehaviorError::InvalidRecord(_)));
    assert!(session.behaviors().list_for_student(1, DateRange::all()).await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_user_reference_is_a_store_error() {
    let db = spawn_store().await;

    let err = db
        .store
        .session()
        .behaviors()
        .record(NewBehaviorRecord::new(7, 8, "positive", "Ghost", 1))
        .await
        .unwrap_err();
    assert!(matches!(err, BehaviorError::Database(_)));
}

#[tokio::test]
async fn update_patches_description_and_points() {
    let db = spawn_store().await;
    let session = db.store.session();
    seed_users(&session).await;
    let behaviors = session.behaviors();

    let record = behaviors
        .record(NewBehaviorRecord::new(1, 2, "positive", "Helped", 5))
        .await
        .unwrap();

    let only_points = behaviors
        .update(
            record.id,
            BehaviorPatch {
                description: None,
                points: Some(0),
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(only_points.points, 0);
    assert_eq!(only_points.description, "Helped");
    assert!(only_points.updated_at >= record.updated_at);
    assert_eq!(only_points.created_at, record.created_at);
    assert_eq!(only_points.timestamp, record.timestamp);

    let blank_description = behaviors
        .update(
            record.id,
            BehaviorPatch {
                description: Some(String::new()),
                points: Some(4),
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(blank_description.description, "Helped");
    assert_eq!(blank_description.points, 4);

    let renamed = behaviors
        .update(
            record.id,
            BehaviorPatch {
                description: Some("Helped a classmate with fractions".to_string()),
                points: None,
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(renamed.description, "Helped a classmate with fractions");
    assert_eq!(renamed.points, 4);

    let stored = behaviors.get(record.id).await.unwrap().unwrap();
    assert_eq!(stored, renamed);
}

#[tokio::test]
async fn update_missing_record_is_none() {
    let db = spawn_store().await;
    let session = db.store.session();
    let behaviors = session.behaviors();

    let result = behaviors
        .update(
            5,
            BehaviorPatch {
                description: Some("x".to_string()),
                points: Some(1),
            },
        )
        .await
        .unwrap();
    assert!(result.is_none());
    assert!(behaviors.get(5).await.unwrap().is_none());
}

#[tokio::test]
async fn point_sign_rule_applies_to_record_and_update() {
    let rules = BehaviorRules {
        enforce_point_sign: true,
        ..BehaviorRules::default()
    };
    let db = spawn_store_with(DeletePolicy::Restrict, rules).await;
    let session = db.store.session();
    seed_users(&session).await;
    let behaviors = session.behaviors();

    let err = behaviors
        .record(NewBehaviorRecord::new(1, 2, "positive", "Backwards", -3))
        .await
        .unwrap_err();
    assert!(matches!(err, BehaviorError::InvalidRecord(_)));

    let record = behaviors
        .record(NewBehaviorRecord::new(1, 2, "negative", "Late", -1))
        .await
        .unwrap();
    let err = behaviors
        .update(
            record.id,
            BehaviorPatch {
                description: None,
                points: Some(2),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, BehaviorError::InvalidRecord(_)));
    assert_eq!(behaviors.get(record.id).await.unwrap().unwrap().points, -1);
}

#[tokio::test]
async fn type_rule_rejects_unknown_types() {
    let rules = BehaviorRules {
        enforce_types: true,
        ..BehaviorRules::default()
    };
    let db = spawn_store_with(DeletePolicy::Restrict, rules).await;
    let session = db.store.session();
    seed_users(&session).await;

    let err = session
        .behaviors()
        .record(NewBehaviorRecord::new(1, 2, "heroic", "Saved the day", 100))
        .await
        .unwrap_err();
    assert!(matches!(err, BehaviorError::InvalidRecord(_)));
}

#[tokio::test]
async fn restrict_policy_blocks_deleting_referenced_user() {
    let db = spawn_store().await;
    let session = db.store.session();
    seed_users(&session).await;

    session
        .behaviors()
        .record(NewBehaviorRecord::new(1, 2, "positive", "Helped", 5))
        .await
        .unwrap();

    for id in [1, 2] {
        let err = session.users().delete(id).await.unwrap_err();
        assert!(matches!(err, UserError::Referenced { records: 1, .. }));
        assert!(session.users().get(id).await.unwrap().is_some());
    }
    assert_eq!(session.behaviors().sum_points(1, DateRange::all()).await.unwrap(), 5);
}

#[tokio::test]
async fn cascade_policy_removes_referencing_records() {
    let db = spawn_store_with(DeletePolicy::Cascade, BehaviorRules::default()).await;
    let session = db.store.session();
    seed_users(&session).await;
    let users = session.users();
    let third = users
        .create(NewUser::new("uma", "uma@school.test", "student"))
        .await
        .unwrap();

    let behaviors = session.behaviors();
    behaviors
        .record(NewBehaviorRecord::new(1, 2, "positive", "Helped", 5))
        .await
        .unwrap();
    let kept = behaviors
        .record(NewBehaviorRecord::new(third.id, 1, "negative", "Late", -1))
        .await
        .unwrap();

    // Teacher 2 recorded the first record only.
    assert!(users.delete(2).await.unwrap());
    assert!(users.get(2).await.unwrap().is_none());
    assert!(behaviors.list_for_student(1, DateRange::all()).await.unwrap().is_empty());
    assert!(behaviors.get(kept.id).await.unwrap().is_some());

    // Student 1 recorded the remaining one.
    assert!(users.delete(1).await.unwrap());
    assert!(behaviors.get(kept.id).await.unwrap().is_none());
}

#[tokio::test]
async fn with_session_scopes_a_unit_of_work() {
    let db = spawn_store().await;
    let store: &Store = &db.store;

    let id = store
        .with_session(|session| async move {
            seed_users(&session).await;
            let record = session
                .behaviors()
                .record(NewBehaviorRecord::new(1, 2, "positive", "Helped", 5))
                .await?;
            Ok::<_, BehaviorError>(record.id)
        })
        .await
        .unwrap();

    let failed: Result<(), BehaviorError> = store
        .with_session(|session| async move {
            session
                .behaviors()
                .record(NewBehaviorRecord::new(1, 2, "positive", "", 1))
                .await?;
            Ok(())
        })
        .await;
    assert!(failed.is_err());

    // Writes from the first unit of work were committed independently.
    let record = store.session().behaviors().get(id).await.unwrap();
    assert!(record.is_some());
}

#[tokio::test]
async fn sessions_are_released_on_success_and_error() {
    let db = spawn_store().await;
    let store: &Store = &db.store;
    assert_eq!(store.open_sessions(), 0);

    let seen = store
        .with_session(|session| async move {
            seed_users(&session).await;
            Ok::<_, BehaviorError>(store.open_sessions())
        })
        .await
        .unwrap();
    assert_eq!(seen, 1);
    assert_eq!(store.open_sessions(), 0);

    let failed: Result<(), BehaviorError> = store
        .with_session(|session| async move {
            assert_eq!(store.open_sessions(), 1);
            session
                .behaviors()
                .record(NewBehaviorRecord::new(1, 2, "positive", "  ", 1))
                .await?;
            Ok(())
        })
        .await;
    assert!(matches!(failed, Err(BehaviorError::InvalidRecord(_))));
    assert_eq!(store.open_sessions(), 0);

    let clone = store.clone();
    {
        let session = clone.session();
        let _other = store.session();
        assert_eq!(store.open_sessions(), 2);
        session.users().count().await.unwrap();
    }
    assert_eq!(store.open_sessions(), 0);
}

/// Student 1, student 3 and recorder 2, with four incidents over March 2024.
async fn seed_incidents(session: &Session) {
    seed_users(session).await;
    session
        .users()
        .create(NewUser::new("ria", "ria@school.test", "student"))
        .await
        .unwrap();

    let behaviors = session.behaviors();
    for new in [
        NewBehaviorRecord::new(1, 2, "negative", "Late to class", -1).at(at(1, 9)),
        NewBehaviorRecord::new(1, 2, "positive", "Helped clean up", 2).at(at(3, 9)),
        NewBehaviorRecord::new(3, 2, "negative", "LATE again", -1).at(at(5, 9)),
        NewBehaviorRecord::new(3, 2, "positive", "Great essay", 3).at(at(7, 9)),
    ] {
        behaviors.record(new).await.unwrap();
    }
}

#[tokio::test]
async fn search_spans_students_newest_first() {
    let db = spawn_store().await;
    let session = db.store.session();
    seed_incidents(&session).await;
    let behaviors = session.behaviors();

    let all = behaviors.search(&IncidentSearch::default()).await.unwrap();
    let descriptions: Vec<&str> = all.iter().map(|r| r.description.as_str()).collect();
    assert_eq!(
        descriptions,
        ["Great essay", "LATE again", "Helped clean up", "Late to class"]
    );

    let late = behaviors
        .search(&IncidentSearch {
            text: Some("late".to_string()),
            ..IncidentSearch::default()
        })
        .await
        .unwrap();
    assert_eq!(late.len(), 2);
    assert!(late.iter().all(|r| r.description.to_lowercase().contains("late")));

    let by_type = behaviors
        .search(&IncidentSearch {
            text: Some("Positive".to_string()),
            ..IncidentSearch::default()
        })
        .await
        .unwrap();
    assert_eq!(by_type.len(), 2);
    assert!(by_type.iter().all(|r| r.behavior_type == "positive"));
}

#[tokio::test]
async fn search_filters_by_student_range_and_pages() {
    let db = spawn_store().await;
    let session = db.store.session();
    seed_incidents(&session).await;
    let behaviors = session.behaviors();

    let student = behaviors
        .search(&IncidentSearch {
            text: Some("late".to_string()),
            student_id: Some(3),
            ..IncidentSearch::default()
        })
        .await
        .unwrap();
    assert_eq!(student.len(), 1);
    assert_eq!(student[0].description, "LATE again");

    let ranged = behaviors
        .search(&IncidentSearch {
            range: DateRange::between(at(3, 0), at(5, 23)),
            ..IncidentSearch::default()
        })
        .await
        .unwrap();
    assert_eq!(ranged.len(), 2);

    let page = behaviors
        .search(&IncidentSearch {
            skip: 1,
            limit: 2,
            ..IncidentSearch::default()
        })
        .await
        .unwrap();
    let descriptions: Vec<&str> = page.iter().map(|r| r.description.as_str()).collect();
    assert_eq!(descriptions, ["LATE again", "Helped clean up"]);

    let blank = behaviors
        .search(&IncidentSearch {
            text: Some("   ".to_string()),
            ..IncidentSearch::default()
        })
        .await
        .unwrap();
    assert_eq!(blank.len(), 4);

    let none = behaviors
        .search(&IncidentSearch {
            text: Some("nothing like this".to_string()),
            ..IncidentSearch::default()
        })
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn ping_succeeds() {
    let db = spawn_store().await;
    db.store.ping().await.unwrap();
}
