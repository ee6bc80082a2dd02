use std::cmp::Ordering;

use super::ChatSummary;

fn summary(id: &str, pinned: bool) -> ChatSummary {
    let created_ms = ChatSummary::created_ms_from_id(id).unwrap_or(0);
    return ChatSummary {
        id: id.to_string(),
        title: "A chat".to_string(),
        date: ChatSummary::format_date(Some(created_ms)),
        created_ms,
        is_pinned: pinned,
        folder_id: None,
    };
}

#[test]
fn it_parses_the_embedded_timestamp() {
    assert_eq!(
        ChatSummary::created_ms_from_id("chat_1700000000000_ab1cd"),
        Some(1700000000000)
    );
    assert_eq!(ChatSummary::created_ms_from_id("chat_garbage_ab1cd"), None);
    assert_eq!(ChatSummary::created_ms_from_id("no-separators"), None);
}

#[test]
fn it_formats_dates_from_timestamps() {
    assert_eq!(ChatSummary::format_date(Some(0)), "Jan 1, 1970");
    assert_eq!(ChatSummary::format_date(None), "N/A");
}

#[test]
fn it_orders_pinned_chats_first() {
    let pinned = summary("chat_1000_aaaaa", true);
    let newer = summary("chat_2000_bbbbb", false);

    assert_eq!(ChatSummary::compare(&pinned, &newer), Ordering::Less);
    assert_eq!(ChatSummary::compare(&newer, &pinned), Ordering::Greater);
}

#[test]
fn it_orders_unpinned_chats_newest_first() {
    let older = summary("chat_1000_aaaaa", false);
    let newer = summary("chat_2000_bbbbb", false);

    assert_eq!(ChatSummary::compare(&newer, &older), Ordering::Less);
    assert_eq!(ChatSummary::compare(&older, &newer), Ordering::Greater);
}
