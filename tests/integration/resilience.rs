use crate::*;

/// Garbage on the multicast port is dropped and the listener keeps going.
#[tokio::test]
async fn test_malformed_announcements_are_dropped() -> Result<()> {
    let auditor = start_auditor().await?;

    announce(auditor.announce_addr, b"").await?;
    announce(auditor.announce_addr, b"\xff\xfe\xfd").await?;
    announce(auditor.announce_addr, b"{\"uuid\":").await?;
    announce(auditor.announce_addr, br#"{"instrument":"piano","sound":"ti-ta-ti"}"#).await?;
    announce(auditor.announce_addr, br#"{"uuid":"","instrument":"piano"}"#).await?;

    announce(
        auditor.announce_addr,
        &payload("u1", "trumpet", "pouet", "2024-01-01T00:00:00.000Z"),
    )
    .await?;

    let roster = wait_for_roster(auditor.query_addr, 1).await?;
    assert_eq!(roster[0]["uuid"], "u1");
    Ok(())
}

/// Only `uuid` is required; missing fields are simply not served.
#[tokio::test]
async fn test_sparse_announcement_is_accepted() -> Result<()> {
    let auditor = start_auditor().await?;

    announce(auditor.announce_addr, br#"{"uuid":"bare"}"#).await?;

    let roster = wait_for_roster(auditor.query_addr, 1).await?;
    assert_eq!(roster[0], serde_json::json!({ "uuid": "bare" }));
    Ok(())
}

/// Clients that connect and vanish do not disturb the others.
#[tokio::test]
async fn test_abandoned_connections_do_not_stop_queries() -> Result<()> {
    let auditor = start_auditor().await?;
    announce(
        auditor.announce_addr,
        &payload("u1", "drum", "boum-boum", "2024-01-01T00:00:00.000Z"),
    )
    .await?;
    wait_for_roster(auditor.query_addr, 1).await?;

    for _ in 0..10 {
        drop(TcpStream::connect(auditor.query_addr).await?);
    }

    let mut clients = Vec::new();
    for _ in 0..10 {
        let addr = auditor.query_addr;
        clients.push(tokio::spawn(async move { query_roster(addr).await }));
    }
    for client in clients {
        assert_eq!(client.await??.len(), 1);
    }
    Ok(())
}
