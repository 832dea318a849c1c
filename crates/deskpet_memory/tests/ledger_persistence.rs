//! Integration tests for RewardLedger persistence
//!
//! Uses tempfile::TempDir for isolated ledger directories.

use deskpet_memory::RewardLedger;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use std::sync::Arc;

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

/// Test 1: reload with a deleted key backfills only that key
#[test]
fn test_reload_backfills_deleted_key() {
    let dir = tempfile::TempDir::new().unwrap();
    {
        let ledger = RewardLedger::open(dir.path()).unwrap();
        ledger.add_xp(230).unwrap();
        ledger.add_streak(4).unwrap();
    }

    let stats_path = dir.path().join("stats.json");
    let mut stats = read_json(&stats_path);
    stats.as_object_mut().unwrap().remove("streak");
    fs::write(&stats_path, stats.to_string()).unwrap();

    let ledger = RewardLedger::open(dir.path()).unwrap();
    let reloaded = ledger.stats().unwrap();
    assert_eq!(reloaded.xp, 30);
    assert_eq!(reloaded.level, 3);
    assert_eq!(reloaded.streak, 0);

    // The file itself was repaired on open
    assert_eq!(read_json(&stats_path)["streak"], json!(0));
}

/// Test 2: unknown keys written by someone else survive mutations
#[test]
fn test_unknown_keys_preserved() {
    let dir = tempfile::TempDir::new().unwrap();
    fs::write(
        dir.path().join("quests.json"),
        r#"{ "25sec_focus": false, "secret_quest": true }"#,
    )
    .unwrap();

    let ledger = RewardLedger::open(dir.path()).unwrap();
    ledger.complete_quest("25sec_focus").unwrap();
    ledger.reset_daily_quests().unwrap();

    let quests = read_json(&dir.path().join("quests.json"));
    assert_eq!(quests["secret_quest"], json!(true));
    assert_eq!(quests["1min_focus"], json!(false));
    assert_eq!(quests["daily_focus"], json!(false));
}

/// Test 3: corrupt files heal instead of failing
#[test]
fn test_corrupt_files_self_heal() {
    let dir = tempfile::TempDir::new().unwrap();
    fs::write(dir.path().join("stats.json"), "xp=12").unwrap();
    fs::write(dir.path().join("unlocks.json"), "").unwrap();

    let ledger = RewardLedger::open(dir.path()).unwrap();
    assert_eq!(ledger.stats().unwrap().level, 1);
    assert!(ledger.unlock_item("accessories", "bow").unwrap());

    let unlocks = read_json(&dir.path().join("unlocks.json"));
    assert_eq!(unlocks, json!({ "skins": [], "accessories": ["bow"] }));
}

/// Test 4: every call is durable, a second handle sees it immediately
#[test]
fn test_durable_after_call() {
    let dir = tempfile::TempDir::new().unwrap();
    let writer = RewardLedger::open(dir.path()).unwrap();
    let reader = RewardLedger::open(dir.path()).unwrap();

    writer.add_xp(42).unwrap();
    writer.complete_quest("daily_focus").unwrap();

    assert_eq!(reader.stats().unwrap().xp, 57);
    assert!(reader.quests().unwrap()["daily_focus"]);
}

/// Test 5: concurrent mutation from many threads loses nothing
#[test]
fn test_concurrent_mutations() {
    let dir = tempfile::TempDir::new().unwrap();
    let ledger = Arc::new(RewardLedger::open(dir.path()).unwrap());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let ledger = Arc::clone(&ledger);
            std::thread::spawn(move || {
                for _ in 0..25 {
                    ledger.add_xp(3).unwrap();
                }
                ledger.add_streak(1).unwrap();
                ledger.unlock_item("skins", &format!("skin-{}", i)).unwrap();
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let stats = ledger.stats().unwrap();
    // 8 * 25 * 3 = 600 xp = 6 levels
    assert_eq!(stats.level, 7);
    assert_eq!(stats.xp, 0);
    assert_eq!(stats.streak, 8);
    assert_eq!(ledger.unlocks().unwrap()["skins"].len(), 8);
}
