use serde_json::json;

use super::chat_line;
use crate::domain::models::ChatRecord;
use crate::domain::models::CompletionBox;
use crate::domain::models::FolderRecord;
use crate::domain::models::StoreBox;
use crate::domain::models::UserIdentity;
use crate::domain::services::Workspace;
use crate::infrastructure::backends::reviewer::Reviewer;
use crate::infrastructure::stores::rest::RestStore;

fn encoded_map(entries: Vec<(String, String)>) -> String {
    let mut map = serde_json::Map::new();
    for (id, encoded) in entries {
        map.insert(id, json!(encoded));
    }

    return serde_json::Value::Object(map).to_string();
}

async fn listing_workspace(server: &mut mockito::ServerGuard) -> Workspace {
    let chats = vec![
        ChatRecord {
            chat_id: "chat_1000_aaaaa".to_string(),
            name: "Assigned".to_string(),
            folder_id: Some("folder_w".to_string()),
            ..ChatRecord::default()
        },
        ChatRecord {
            chat_id: "chat_2000_bbbbb".to_string(),
            name: "Orphaned".to_string(),
            folder_id: Some("folder_gone".to_string()),
            ..ChatRecord::default()
        },
    ];
    let folders = vec![FolderRecord {
        folder_id: "folder_w".to_string(),
        name: "Work".to_string(),
        ..FolderRecord::default()
    }];

    server
        .mock("GET", "/chat/getall")
        .with_status(200)
        .with_body(encoded_map(
            chats
                .iter()
                .map(|record| {
                    return (
                        record.chat_id.clone(),
                        serde_json::to_string(record).unwrap(),
                    );
                })
                .collect(),
        ))
        .create();
    server
        .mock("GET", "/folder/getall")
        .with_status(200)
        .with_body(encoded_map(
            folders
                .iter()
                .map(|record| {
                    return (
                        record.folder_id.clone(),
                        serde_json::to_string(record).unwrap(),
                    );
                })
                .collect(),
        ))
        .create();

    let store: StoreBox = Box::new(RestStore::with_url(server.url()));
    let completion: CompletionBox = Box::new(Reviewer::with_url(server.url()));
    let mut ws = Workspace::new(store, completion, UserIdentity::named("Sam"));
    ws.refresh_chats().await;
    ws.refresh_folders().await;

    return ws;
}

#[tokio::test]
async fn it_prints_the_folder_name_for_assigned_chats() {
    let mut server = mockito::Server::new();
    let ws = listing_workspace(&mut server).await;

    let chat = ws.chats().iter().find(|c| return c.title == "Assigned").unwrap();
    let line = chat_line(&ws, chat);

    assert!(line.contains("Folder: Work"));
}

#[tokio::test]
async fn it_lists_chats_with_dangling_folder_ids_as_unassigned() {
    let mut server = mockito::Server::new();
    let ws = listing_workspace(&mut server).await;

    let chat = ws.chats().iter().find(|c| return c.title == "Orphaned").unwrap();
    let line = chat_line(&ws, chat);

    assert!(!line.contains("Folder:"));
    assert!(!line.contains("folder_gone"));
}
