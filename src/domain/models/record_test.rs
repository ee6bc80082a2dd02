use super::ChatRecord;
use super::FolderRecord;
use super::Message;
use super::MessageRecord;
use super::Sender;

#[test]
fn it_decodes_a_chat_record() {
    let raw = r#"{"chat_id":"chat_1700000000000_ab1cd","name":"Review my parser","messages":{},"folder_id":null,"pin_status":true}"#;
    let record = ChatRecord::decode(raw).unwrap();

    assert_eq!(record.chat_id, "chat_1700000000000_ab1cd");
    assert_eq!(record.name, "Review my parser");
    assert!(record.pin_status);
    assert_eq!(record.folder_id, None);
}

#[test]
fn it_tolerates_missing_optional_fields() {
    let raw = r#"{"chat_id":"chat_1700000000000_ab1cd","name":"Bare"}"#;
    let record = ChatRecord::decode(raw).unwrap();

    assert!(record.messages.is_empty());
    assert!(!record.pin_status);
}

#[test]
fn it_drops_undecodable_chat_records() {
    assert!(ChatRecord::decode("not json at all").is_none());
    assert!(ChatRecord::decode(r#"{"name":"No id","chat_id":""}"#).is_none());
    assert!(ChatRecord::decode(r#"{"chat_id":"chat_1_aaaaa","name":""}"#).is_none());
}

#[test]
fn it_derives_a_summary_from_the_id_timestamp() {
    let record = ChatRecord {
        chat_id: "chat_0_aaaaa".to_string(),
        name: "Old one".to_string(),
        ..ChatRecord::default()
    };
    let summary = record.summary();

    assert_eq!(summary.created_ms, 0);
    assert_eq!(summary.date, "Jan 1, 1970");
    assert!(!summary.is_pinned);
}

#[test]
fn it_marks_unparseable_ids_as_undated() {
    let record = ChatRecord {
        chat_id: "imported-legacy-id".to_string(),
        name: "Legacy".to_string(),
        ..ChatRecord::default()
    };
    let summary = record.summary();

    assert_eq!(summary.created_ms, 0);
    assert_eq!(summary.date, "N/A");
}

#[test]
fn it_sorts_messages_by_timestamp() {
    let mut record = ChatRecord {
        chat_id: "chat_1_aaaaa".to_string(),
        name: "Ordered".to_string(),
        ..ChatRecord::default()
    };
    record.messages.insert(
        "user_2".to_string(),
        MessageRecord {
            sender: Sender::User,
            content: "second".to_string(),
            timestamp: "2024-01-01T10:05:00Z".to_string(),
        },
    );
    record.messages.insert(
        "asst_1".to_string(),
        MessageRecord {
            sender: Sender::Assistant,
            content: "first".to_string(),
            timestamp: "2024-01-01T10:00:00Z".to_string(),
        },
    );

    let messages = record.sorted_messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].content, "first");
    assert_eq!(messages[1].content, "second");
}

#[test]
fn it_falls_back_to_id_order_for_bad_timestamps() {
    let mut record = ChatRecord {
        chat_id: "chat_1_aaaaa".to_string(),
        name: "Unordered".to_string(),
        ..ChatRecord::default()
    };
    record.messages.insert(
        "b".to_string(),
        MessageRecord {
            sender: Sender::User,
            content: "later id".to_string(),
            timestamp: "whenever".to_string(),
        },
    );
    record.messages.insert(
        "a".to_string(),
        MessageRecord {
            sender: Sender::User,
            content: "earlier id".to_string(),
            timestamp: "".to_string(),
        },
    );

    let messages = record.sorted_messages();
    assert_eq!(messages[0].id, "a");
    assert_eq!(messages[1].id, "b");
}

#[test]
fn it_merges_messages_into_the_stored_map() {
    let mut record = ChatRecord {
        chat_id: "chat_1_aaaaa".to_string(),
        name: "Merge target".to_string(),
        ..ChatRecord::default()
    };
    let message = Message::user("save me");
    record.insert_message(&message);

    let stored = record.messages.get(&message.id).unwrap();
    assert_eq!(stored.sender, Sender::User);
    assert_eq!(stored.content, "save me");
    assert_eq!(stored.timestamp, message.timestamp);
}

#[test]
fn it_decodes_a_folder_record() {
    let raw = r#"{"folder_id":"folder_abc","name":"Work","count":3,"chat_ids":["chat_1_aaaaa"],"pin_status":false}"#;
    let record = FolderRecord::decode(raw).unwrap();

    assert_eq!(record.folder_id, "folder_abc");
    assert_eq!(record.name, "Work");
    assert_eq!(record.chat_ids, vec!["chat_1_aaaaa".to_string()]);
}

#[test]
fn it_drops_incomplete_folder_records() {
    assert!(FolderRecord::decode("{}").is_none());
    assert!(FolderRecord::decode(r#"{"folder_id":"folder_abc","name":""}"#).is_none());
}

#[test]
fn it_rebuilds_a_folder_record_from_local_state() {
    let record = FolderRecord {
        folder_id: "folder_abc".to_string(),
        name: "Work".to_string(),
        count: 2,
        chat_ids: vec!["chat_1_aaaaa".to_string()],
        pin_status: true,
    };
    let local = record.display(2);
    let rebuilt = FolderRecord::from_local(&local);

    assert_eq!(rebuilt.folder_id, "folder_abc");
    assert_eq!(rebuilt.name, "Work");
    assert_eq!(rebuilt.count, 2);
    assert!(rebuilt.pin_status);
    // The stored chat id list can't be recovered locally.
    assert!(rebuilt.chat_ids.is_empty());
}
