//! Temp-file database fixture shared by the repository tests.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal_macros::dec;
use tempfile::TempDir;

use commitment_core::groups::{GroupRepositoryTrait, NewGroup, NewMember};
use commitment_core::penalties::NewPenalty;

use crate::db::{create_pool, run_migrations, spawn_writer, DbPool, WriteHandle};
use crate::groups::GroupRepository;

pub struct TestDb {
    pub pool: Arc<DbPool>,
    pub writer: WriteHandle,
    _temp_dir: TempDir,
}

/// A migrated database in a temp dir, seeded with group `g1` and members
/// `alex` (admin) and `sam`.
pub async fn create_test_db() -> TestDb {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let db_path = temp_dir.path().join("test.db");
    let db_path_str = db_path.to_string_lossy().to_string();

    let pool = create_pool(&db_path_str).expect("Failed to create pool");
    run_migrations(&pool).expect("Failed to run migrations");
    let writer = spawn_writer((*pool).clone());

    let groups = GroupRepository::new(Arc::clone(&pool), writer.clone());
    groups
        .insert_group(NewGroup {
            id: Some("g1".to_string()),
            name: "Morning crew".to_string(),
            target_points: 50,
            penalty_rate: dec!(10),
            currency_symbol: Some("€".to_string()),
            timezone: Some("UTC".to_string()),
        })
        .await
        .expect("Failed to insert group");
    for (user_id, is_admin) in [("alex", true), ("sam", false)] {
        groups
            .insert_member(
                "g1",
                NewMember {
                    user_id: Some(user_id.to_string()),
                    username: user_id.to_string(),
                    is_admin,
                    rest_days: Vec::new(),
                },
            )
            .await
            .expect("Failed to insert member");
    }

    TestDb {
        pool,
        writer,
        _temp_dir: temp_dir,
    }
}

pub fn ts(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
}

/// A miss on 2024-03-`d`, created at 06:00 the next morning.
pub fn new_penalty(user_id: &str, d: u32) -> NewPenalty {
    NewPenalty::new(user_id, "g1", day(d), 50, 30, dec!(10), ts(2024, 3, d + 1, 6))
}
