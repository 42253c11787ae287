use crate::*;
use serde_json::json;

/// A piano joins, shows up in the roster without its sound, then goes silent
/// and disappears.
#[tokio::test]
async fn test_join_then_expire() -> Result<()> {
    let auditor = start_auditor().await?;

    announce(
        auditor.announce_addr,
        &payload("u1", "piano", "ti-ta-ti", "2024-01-01T00:00:00Z"),
    )
    .await?;

    let roster = wait_for_roster(auditor.query_addr, 1).await?;
    assert_eq!(
        Value::Array(roster),
        json!([{
            "uuid": "u1",
            "instrument": "piano",
            "activeSince": "2024-01-01T00:00:00Z",
        }])
    );

    tokio::time::sleep(EXPIRE_WAIT).await;

    assert_eq!(query_raw(auditor.query_addr).await?, b"[]\r\n");
    assert!(auditor.roster.is_empty(), "sweeper should have removed u1");
    Ok(())
}

/// Descriptive key names are understood by the running daemon and served
/// back under the musician keys.
#[tokio::test]
async fn test_descriptive_keys_join_then_expire() -> Result<()> {
    let auditor = start_auditor().await?;

    let beat = json!({
        "identity": "u1",
        "category": "piano",
        "status": "ti-ta-ti",
        "activeSince": "2024-01-01T00:00:00Z",
    })
    .to_string();
    announce(auditor.announce_addr, beat.as_bytes()).await?;

    let roster = wait_for_roster(auditor.query_addr, 1).await?;
    assert_eq!(
        Value::Array(roster),
        json!([{
            "uuid": "u1",
            "instrument": "piano",
            "activeSince": "2024-01-01T00:00:00Z",
        }])
    );

    // Both spellings in one payload still count as a heartbeat.
    let both = json!({
        "uuid": "u2",
        "identity": "u2",
        "instrument": "drum",
        "category": "drum",
    })
    .to_string();
    announce(auditor.announce_addr, both.as_bytes()).await?;
    wait_for_roster(auditor.query_addr, 2).await?;

    tokio::time::sleep(EXPIRE_WAIT).await;
    assert_eq!(query_raw(auditor.query_addr).await?, b"[]\r\n");
    Ok(())
}

/// Repeated announcements from the same musician never duplicate it.
#[tokio::test]
async fn test_one_entry_per_musician() -> Result<()> {
    let auditor = start_auditor().await?;

    for _ in 0..20 {
        announce(
            auditor.announce_addr,
            &payload("u1", "piano", "ti-ta-ti", "2024-01-01T00:00:00.000Z"),
        )
        .await?;
        announce(
            auditor.announce_addr,
            &payload("u2", "drum", "boum-boum", "2024-01-01T00:00:01.000Z"),
        )
        .await?;
    }

    let roster = wait_for_roster(auditor.query_addr, 2).await?;
    let mut uuids: Vec<&str> = roster.iter().filter_map(|m| m["uuid"].as_str()).collect();
    uuids.sort();
    assert_eq!(uuids, ["u1", "u2"]);
    assert_eq!(auditor.roster.len(), 2);
    Ok(())
}

/// A musician that keeps announcing outlives several TTLs.
#[tokio::test]
async fn test_announcing_musician_stays() -> Result<()> {
    let auditor = start_auditor().await?;
    let beat = payload("u1", "violin", "gzi-gzi", "2024-01-01T00:00:00.000Z");

    announce(auditor.announce_addr, &beat).await?;
    wait_for_roster(auditor.query_addr, 1).await?;

    // Refresh well inside the TTL for about three TTLs.
    for _ in 0..9 {
        tokio::time::sleep(TTL / 3).await;
        announce(auditor.announce_addr, &beat).await?;
    }
    assert_eq!(query_roster(auditor.query_addr).await?.len(), 1);

    tokio::time::sleep(EXPIRE_WAIT).await;
    assert!(query_roster(auditor.query_addr).await?.is_empty());
    Ok(())
}

/// An expired musician that starts announcing again rejoins the roster.
#[tokio::test]
async fn test_expired_musician_rejoins() -> Result<()> {
    let auditor = start_auditor().await?;
    let beat = payload("u1", "flute", "trulu", "2024-01-01T00:00:00.000Z");

    announce(auditor.announce_addr, &beat).await?;
    wait_for_roster(auditor.query_addr, 1).await?;

    tokio::time::sleep(EXPIRE_WAIT).await;
    assert!(query_roster(auditor.query_addr).await?.is_empty());

    announce(auditor.announce_addr, &beat).await?;
    let roster = wait_for_roster(auditor.query_addr, 1).await?;
    assert_eq!(roster[0]["instrument"], "flute");
    Ok(())
}
