use std::env;

use uuid::Uuid;

use super::Config;
use super::ConfigKey;
use crate::application::cli;

#[test]
fn it_serializes_a_valid_default_config() {
    let toml_str = Config::serialize_default(cli::build());
    let doc = toml_str.parse::<toml_edit::Document>().unwrap();

    assert!(doc.get("store-url").is_some());
    assert!(doc.get("model-url").is_some());
    assert!(doc.get("theme").is_some());
    assert!(doc.get("health-check-timeout").is_some());
    // The config file path never belongs inside the config file.
    assert!(doc.get("config-file").is_none());
}

// Config is process-global, so layering is exercised in a single test.
#[tokio::test]
async fn it_layers_defaults_file_and_cli_values() {
    let matches = cli::build()
        .try_get_matches_from(vec!["granary", "chats", "list"])
        .unwrap();
    Config::load(cli::build(), vec![&matches]).await.unwrap();

    assert_eq!(Config::get(ConfigKey::Theme), "light");
    assert_eq!(Config::get(ConfigKey::StoreUrl), "http://localhost:8000");
    assert_eq!(Config::get(ConfigKey::HealthCheckTimeout), "1000");
    assert!(!Config::get(ConfigKey::Username).is_empty());

    let config_path = env::temp_dir().join(format!("granary-config-{}.toml", Uuid::new_v4()));
    tokio::fs::write(
        &config_path,
        "theme = \"dark\"\nstore-url = \"http://store:9000\"\nhealth-check-timeout = 250\n",
    )
    .await
    .unwrap();
    let config_path_str = config_path.to_str().unwrap().to_string();

    let matches = cli::build()
        .try_get_matches_from(vec![
            "granary",
            "--config-file",
            &config_path_str,
            "chats",
            "list",
        ])
        .unwrap();
    Config::load(cli::build(), vec![&matches]).await.unwrap();

    assert_eq!(Config::get(ConfigKey::Theme), "dark");
    assert_eq!(Config::get(ConfigKey::StoreUrl), "http://store:9000");
    assert_eq!(Config::get(ConfigKey::HealthCheckTimeout), "250");
    assert_eq!(Config::get(ConfigKey::ModelUrl), "http://localhost:8000");

    // CLI flags win over the file.
    let matches = cli::build()
        .try_get_matches_from(vec![
            "granary",
            "--config-file",
            &config_path_str,
            "--theme",
            "light",
            "chats",
            "list",
        ])
        .unwrap();
    Config::load(cli::build(), vec![&matches]).await.unwrap();

    assert_eq!(Config::get(ConfigKey::Theme), "light");
    assert_eq!(Config::get(ConfigKey::StoreUrl), "http://store:9000");

    // Values outside the allowed set are rejected with the options listed.
    tokio::fs::write(&config_path, "theme = \"solarized\"\n")
        .await
        .unwrap();
    let matches = cli::build()
        .try_get_matches_from(vec![
            "granary",
            "--config-file",
            &config_path_str,
            "chats",
            "list",
        ])
        .unwrap();
    let err = Config::load(cli::build(), vec![&matches])
        .await
        .unwrap_err();

    assert!(err.to_string().contains("invalid value"));
    assert!(err.to_string().contains("light, dark"));

    tokio::fs::remove_file(config_path).await.unwrap();
}
