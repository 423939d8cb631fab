use super::*;

#[tokio::test]
async fn test_member_pages_follow_cursor() {
    let platform = InMemoryPlatform::with_page_size(2);
    platform.add_channel("C1", "U0");
    platform.set_members("C1", &["U1", "U2", "U3"]);

    let first = platform.list_channel_members("C1", None).await.unwrap();
    assert_eq!(first.user_ids, vec!["U1", "U2"]);
    let second = platform
        .list_channel_members("C1", first.next_cursor)
        .await
        .unwrap();
    assert_eq!(second.user_ids, vec!["U3"]);
    assert!(second.next_cursor.is_none());
}

#[tokio::test]
async fn test_group_conversation_id_is_order_independent() {
    let platform = InMemoryPlatform::new();
    let a = platform
        .open_conversation(&["U2".to_string(), "U1".to_string()])
        .await
        .unwrap();
    let b = platform
        .open_conversation(&["U1".to_string(), "U2".to_string()])
        .await
        .unwrap();
    assert_eq!(a, b);
    assert_eq!(a, "GU1-U2");
}

#[tokio::test]
async fn test_failing_conversation_rejects_posts() {
    let platform = InMemoryPlatform::new();
    platform.fail_posts_to("C1");

    let notification = Notification::RoundStats {
        channel_id: "C1".to_string(),
        total: 1,
        met: 1,
        percent: 100,
    };
    assert!(platform.post_message("C1", &notification).await.is_err());
    assert!(platform.posted().is_empty());
}
