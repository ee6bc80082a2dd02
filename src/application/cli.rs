#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;

use std::path;

use anyhow::bail;
use anyhow::Result;
use clap::builder::PossibleValuesParser;
use clap::Arg;
use clap::ArgAction;
use clap::ArgMatches;
use clap::Command;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Confirm;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use yansi::Paint;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::ChatSummary;
use crate::domain::models::CompletionBox;
use crate::domain::models::MessageKind;
use crate::domain::models::RecordStore;
use crate::domain::models::Sender;
use crate::domain::models::StoreBox;
use crate::domain::models::UserIdentity;
use crate::domain::services::Profile;
use crate::domain::services::StoredProfile;
use crate::domain::services::Workspace;
use crate::infrastructure::backends::reviewer::Reviewer;
use crate::infrastructure::stores::rest::RestStore;

const THEMES: [&str; 2] = ["light", "dark"];

async fn resolve_identity() -> UserIdentity {
    if let Ok(Some(profile)) = Profile::default().load().await {
        if !profile.identity.name.is_empty() {
            return profile.identity;
        }
    }

    return UserIdentity::named(&Config::get(ConfigKey::Username));
}

async fn workspace() -> Workspace {
    let store: StoreBox = Box::<RestStore>::default();
    let completion: CompletionBox = Box::<Reviewer>::default();
    let identity = resolve_identity().await;

    return Workspace::new(store, completion, identity);
}

fn report_errors(ws: &Workspace) -> bool {
    let mut reported = false;
    if let Some(err) = ws.chat_error() {
        eprintln!("{}", Paint::red(err));
        reported = true;
    }
    if let Some(err) = ws.folder_error() {
        eprintln!("{}", Paint::red(err));
        reported = true;
    }

    return reported;
}

// A folder id pointing at no known folder is treated as unassigned.
fn chat_line(ws: &Workspace, chat: &ChatSummary) -> String {
    let mut line = format!("- (ID: {}) {}, {}", chat.id, chat.title, chat.date);
    let folder_name = chat
        .folder_id
        .as_ref()
        .and_then(|folder_id| return ws.folders().iter().find(|f| return &f.id == folder_id))
        .map(|f| return f.name.clone());
    if let Some(folder_name) = folder_name {
        line = format!("{line}, Folder: {folder_name}");
    }
    if chat.is_pinned {
        line = format!("{line} {}", Paint::yellow("[pinned]"));
    }

    return line;
}

fn print_chats(ws: &Workspace) {
    if ws.chats().is_empty() {
        println!("There are no chats yet. You should start your first one!");
        return;
    }

    for chat in ws.chats() {
        println!("{}", chat_line(ws, chat));
    }
}

fn print_folders(ws: &Workspace) {
    if ws.folders().is_empty() {
        println!("There are no folders yet.");
        return;
    }

    for folder in ws.folders() {
        let mut line = format!(
            "- (ID: {}) {}, {} chat(s)",
            folder.id, folder.name, folder.chat_count
        );
        if folder.is_pinned {
            line = format!("{line} {}", Paint::yellow("[pinned]"));
        }
        println!("{line}");
    }
}

fn print_conversation(ws: &Workspace) {
    let Some(conversation) = ws.conversation() else {
        println!(
            "Hello, {}! How can I assist you today?",
            ws.identity().display_name()
        );
        return;
    };

    println!("{}", Paint::new(&conversation.title).bold());
    for message in &conversation.messages {
        let label = match message.sender {
            Sender::User => ws.identity().display_name(),
            Sender::Assistant => "Assistant".to_string(),
        };

        if message.kind() == MessageKind::Error {
            println!("{}: {}", Paint::red(label), Paint::red(&message.content));
        } else {
            println!("{}: {}", Paint::cyan(label), message.content);
        }
    }
}

async fn create_config_file() -> Result<()> {
    let config_file_path_str = Config::default(ConfigKey::ConfigFile);
    let config_file_path = path::PathBuf::from(&config_file_path_str);
    if config_file_path.exists() {
        bail!(format!(
            "Config file already exists at {config_file_path_str}"
        ));
    }

    if !config_file_path.parent().unwrap().exists() {
        fs::create_dir_all(config_file_path.parent().unwrap()).await?;
    }

    let mut file = fs::File::create(config_file_path.clone()).await?;
    file.write_all(Config::serialize_default(build()).as_bytes())
        .await?;

    let config_path_display = config_file_path.as_os_str().to_str().unwrap();
    println!("Created default config file at {config_path_display}");
    return Ok(());
}

fn confirm_delete(prompt: &str, skip: bool) -> Result<bool> {
    if skip {
        return Ok(true);
    }

    return Ok(Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(false)
        .interact()?);
}

fn arg_yes() -> Arg {
    return Arg::new("yes")
        .short('y')
        .long("yes")
        .help("Skip the confirmation prompt.")
        .action(ArgAction::SetTrue);
}

fn arg_store_url() -> Arg {
    return Arg::new(ConfigKey::StoreUrl.to_string())
        .long(ConfigKey::StoreUrl.to_string())
        .env("GRANARY_STORE_URL")
        .num_args(1)
        .help(format!(
            "Record store API URL. [default: {}]",
            Config::default(ConfigKey::StoreUrl)
        ))
        .global(true);
}

fn arg_model_url() -> Arg {
    return Arg::new(ConfigKey::ModelUrl.to_string())
        .long(ConfigKey::ModelUrl.to_string())
        .env("GRANARY_MODEL_URL")
        .num_args(1)
        .help(format!(
            "Review model API URL. [default: {}]",
            Config::default(ConfigKey::ModelUrl)
        ))
        .global(true);
}

fn arg_health_check_timeout() -> Arg {
    return Arg::new(ConfigKey::HealthCheckTimeout.to_string())
        .long(ConfigKey::HealthCheckTimeout.to_string())
        .env("GRANARY_HEALTH_CHECK_TIMEOUT")
        .num_args(1)
        .help(format!(
            "Time to wait in milliseconds before timing out when doing a healthcheck. [default: {}]",
            Config::default(ConfigKey::HealthCheckTimeout)
        ))
        .global(true);
}

fn arg_username() -> Arg {
    return Arg::new(ConfigKey::Username.to_string())
        .short('u')
        .long(ConfigKey::Username.to_string())
        .env("GRANARY_USERNAME")
        .num_args(1)
        .help("Your user name, used in greetings when no profile is saved.")
        .global(true);
}

fn arg_theme() -> Arg {
    return Arg::new(ConfigKey::Theme.to_string())
        .short('t')
        .long(ConfigKey::Theme.to_string())
        .env("GRANARY_THEME")
        .num_args(1)
        .help(format!(
            "Display theme. [default: {}]",
            Config::default(ConfigKey::Theme)
        ))
        .value_parser(PossibleValuesParser::new(THEMES))
        .global(true);
}

fn arg_config_file() -> Arg {
    return Arg::new(ConfigKey::ConfigFile.to_string())
        .short('c')
        .long(ConfigKey::ConfigFile.to_string())
        .env("GRANARY_CONFIG_FILE")
        .num_args(1)
        .help(format!(
            "Path to configuration file [default: {}]",
            Config::default(ConfigKey::ConfigFile)
        ))
        .global(true);
}

fn subcommand_chats() -> Command {
    return Command::new("chats")
        .about("Manage the chat list.")
        .arg_required_else_help(true)
        .subcommand(Command::new("list").about("List all chats, pinned first."))
        .subcommand(
            Command::new("new")
                .about("Create a new chat and select it.")
                .arg(Arg::new("title").help("Chat title.").required(true)),
        )
        .subcommand(
            Command::new("rename")
                .about("Rename a chat. An empty or unchanged name is ignored.")
                .arg(Arg::new("chat-id").help("Chat ID.").required(true))
                .arg(Arg::new("name").help("New title.").required(true)),
        )
        .subcommand(
            Command::new("pin")
                .about("Toggle a chat's pinned state.")
                .arg(Arg::new("chat-id").help("Chat ID.").required(true)),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete a chat from the store.")
                .arg(Arg::new("chat-id").help("Chat ID.").required(true))
                .arg(arg_yes()),
        )
        .subcommand(
            Command::new("assign")
                .about("Move a chat into a folder.")
                .arg(Arg::new("chat-id").help("Chat ID.").required(true))
                .arg(Arg::new("folder-id").help("Folder ID.").required(true)),
        );
}

fn subcommand_folders() -> Command {
    return Command::new("folders")
        .about("Manage folders.")
        .arg_required_else_help(true)
        .subcommand(Command::new("list").about("List all folders with their chat counts."))
        .subcommand(
            Command::new("new")
                .about("Create a new folder.")
                .arg(Arg::new("name").help("Folder name.").required(true)),
        )
        .subcommand(
            Command::new("rename")
                .about("Rename a folder. An empty or unchanged name is ignored.")
                .arg(Arg::new("folder-id").help("Folder ID.").required(true))
                .arg(Arg::new("name").help("New name.").required(true)),
        )
        .subcommand(
            Command::new("pin")
                .about("Toggle a folder's pinned state.")
                .arg(Arg::new("folder-id").help("Folder ID.").required(true)),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete a folder. Its chats are detached, not deleted.")
                .arg(Arg::new("folder-id").help("Folder ID.").required(true))
                .arg(arg_yes()),
        );
}

fn subcommand_config() -> Command {
    return Command::new("config")
        .about("Configuration file options.")
        .subcommand(
            Command::new("create").about("Saves the default config file to the configuration file path. This command will fail if the file exists already.")
        )
        .subcommand(
            Command::new("default").about("Outputs the default configuration file to stdout.")
        )
        .subcommand(
            Command::new("path").about("Returns the default path for the configuration file.")
        );
}

pub fn build() -> Command {
    let about = format!(
        "{}\n\nVersion: {}\nCommit: {}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION"),
        env!("VERGEN_GIT_DESCRIBE")
    );

    return Command::new("granary")
        .about(about)
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .arg_required_else_help(true)
        .subcommand(subcommand_chats())
        .subcommand(subcommand_folders())
        .subcommand(subcommand_config())
        .subcommand(
            Command::new("open")
                .about("Open a chat and print its conversation.")
                .arg(Arg::new("chat-id").help("Chat ID.").required(true)),
        )
        .subcommand(
            Command::new("say")
                .about("Send a message to a chat and print the response.")
                .arg(Arg::new("chat-id").help("Chat ID.").required(true))
                .arg(
                    Arg::new("text")
                        .help("Message text.")
                        .num_args(1..)
                        .required(true),
                ),
        )
        .subcommand(
            Command::new("login")
                .about("Save your identity after signing in with the external login flow.")
                .arg(Arg::new("name").long("name").num_args(1).required(true))
                .arg(Arg::new("email").long("email").num_args(1).required(true))
                .arg(Arg::new("avatar").long("avatar").num_args(1)),
        )
        .subcommand(Command::new("logout").about("Forget the saved identity."))
        .subcommand(
            Command::new("theme")
                .about("Persist the display theme preference.")
                .arg(
                    Arg::new("name")
                        .help("Theme name.")
                        .value_parser(PossibleValuesParser::new(THEMES))
                        .required(true),
                ),
        )
        .arg(arg_store_url())
        .arg(arg_model_url())
        .arg(arg_health_check_timeout())
        .arg(arg_username())
        .arg(arg_theme())
        .arg(arg_config_file());
}

async fn run_chats(matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("list", _)) => {
            let mut ws = workspace().await;
            ws.refresh_chats().await;
            ws.refresh_folders().await;
            report_errors(&ws);
            print_chats(&ws);
        }
        Some(("new", sub)) => {
            let title = sub.get_one::<String>("title").unwrap();
            let mut ws = workspace().await;
            ws.health_check().await?;
            if let Some(chat_id) = ws.create_chat(title).await {
                println!("Created chat {chat_id}");
                print_conversation(&ws);
            }
            report_errors(&ws);
        }
        Some(("rename", sub)) => {
            let chat_id = sub.get_one::<String>("chat-id").unwrap();
            let name = sub.get_one::<String>("name").unwrap();
            let mut ws = workspace().await;
            ws.refresh_chats().await;
            ws.rename_chat(chat_id, name).await;
            if !report_errors(&ws) {
                println!("Renamed chat {chat_id}");
            }
        }
        Some(("pin", sub)) => {
            let chat_id = sub.get_one::<String>("chat-id").unwrap();
            let mut ws = workspace().await;
            ws.refresh_chats().await;
            ws.toggle_chat_pin(chat_id).await;
            if !report_errors(&ws) {
                let pinned = ws
                    .chats()
                    .iter()
                    .find(|c| return &c.id == chat_id)
                    .is_some_and(|c| return c.is_pinned);
                if pinned {
                    println!("Pinned chat {chat_id}");
                } else {
                    println!("Unpinned chat {chat_id}");
                }
            }
        }
        Some(("delete", sub)) => {
            let chat_id = sub.get_one::<String>("chat-id").unwrap();
            let mut ws = workspace().await;
            ws.refresh_chats().await;
            let title = ws
                .chats()
                .iter()
                .find(|c| return &c.id == chat_id)
                .map(|c| return c.title.clone())
                .unwrap_or_else(|| return chat_id.to_string());

            if !confirm_delete(&format!("Delete chat \"{title}\"?"), sub.get_flag("yes"))? {
                return Ok(());
            }

            ws.delete_chat(chat_id).await;
            if !report_errors(&ws) {
                println!("Deleted chat {chat_id}");
            }
        }
        Some(("assign", sub)) => {
            let chat_id = sub.get_one::<String>("chat-id").unwrap();
            let folder_id = sub.get_one::<String>("folder-id").unwrap();
            let mut ws = workspace().await;
            ws.refresh_chats().await;
            ws.refresh_folders().await;
            ws.assign_chat(chat_id, folder_id).await;
            if !report_errors(&ws) {
                println!("Moved chat {chat_id} into {folder_id}");
            }
        }
        _ => {
            subcommand_chats().print_long_help()?;
        }
    }

    return Ok(());
}

async fn run_folders(matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("list", _)) => {
            let mut ws = workspace().await;
            ws.refresh_chats().await;
            ws.refresh_folders().await;
            report_errors(&ws);
            print_folders(&ws);
        }
        Some(("new", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let mut ws = workspace().await;
            if let Some(folder_id) = ws.create_folder(name).await {
                println!("Created folder {folder_id}");
            }
            report_errors(&ws);
        }
        Some(("rename", sub)) => {
            let folder_id = sub.get_one::<String>("folder-id").unwrap();
            let name = sub.get_one::<String>("name").unwrap();
            let mut ws = workspace().await;
            ws.refresh_chats().await;
            ws.refresh_folders().await;
            ws.rename_folder(folder_id, name).await;
            if !report_errors(&ws) {
                println!("Renamed folder {folder_id}");
            }
        }
        Some(("pin", sub)) => {
            let folder_id = sub.get_one::<String>("folder-id").unwrap();
            let mut ws = workspace().await;
            ws.refresh_chats().await;
            ws.refresh_folders().await;
            ws.toggle_folder_pin(folder_id).await;
            report_errors(&ws);
        }
        Some(("delete", sub)) => {
            let folder_id = sub.get_one::<String>("folder-id").unwrap();
            let mut ws = workspace().await;
            ws.refresh_chats().await;
            ws.refresh_folders().await;
            let name = ws
                .folders()
                .iter()
                .find(|f| return &f.id == folder_id)
                .map(|f| return f.name.clone())
                .unwrap_or_else(|| return folder_id.to_string());

            if !confirm_delete(&format!("Delete folder \"{name}\"?"), sub.get_flag("yes"))? {
                return Ok(());
            }

            ws.delete_folder(folder_id).await;
            if !report_errors(&ws) {
                println!("Deleted folder {folder_id}. Its chats were kept.");
            }
        }
        _ => {
            subcommand_folders().print_long_help()?;
        }
    }

    return Ok(());
}

async fn run_login(matches: &ArgMatches) -> Result<()> {
    let identity = UserIdentity {
        name: matches.get_one::<String>("name").unwrap().to_string(),
        email: matches.get_one::<String>("email").unwrap().to_string(),
        avatar_url: matches
            .get_one::<String>("avatar")
            .cloned()
            .unwrap_or_default(),
    };

    let profile = Profile::default();
    let theme = profile
        .load()
        .await?
        .map(|p| return p.theme)
        .unwrap_or_else(|| return Config::get(ConfigKey::Theme));
    profile
        .save(&StoredProfile {
            identity: identity.clone(),
            theme,
        })
        .await?;

    // Best-effort sign-in ledger; the store being down shouldn't block login.
    let store = RestStore::default();
    if let Err(err) = store.record_login(&identity.name, &identity.email).await {
        tracing::warn!(error = %err, "Failed to record login");
    }

    println!("Signed in as {} <{}>", identity.name, identity.email);
    return Ok(());
}

pub async fn parse() -> Result<()> {
    let matches = build().get_matches();

    match matches.subcommand() {
        Some(("chats", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            run_chats(subcmd_matches).await?;
        }
        Some(("folders", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            run_folders(subcmd_matches).await?;
        }
        Some(("open", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            let chat_id = subcmd_matches.get_one::<String>("chat-id").unwrap();
            let mut ws = workspace().await;
            ws.refresh_chats().await;
            ws.select_chat(chat_id).await;
            report_errors(&ws);
            print_conversation(&ws);
        }
        Some(("say", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            let chat_id = subcmd_matches.get_one::<String>("chat-id").unwrap();
            let text = subcmd_matches
                .get_many::<String>("text")
                .unwrap()
                .cloned()
                .collect::<Vec<String>>()
                .join(" ");

            let mut ws = workspace().await;
            ws.health_check().await?;
            ws.refresh_chats().await;
            ws.select_chat(chat_id).await;
            ws.send_message(&text).await;
            report_errors(&ws);
            print_conversation(&ws);
        }
        Some(("login", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            run_login(subcmd_matches).await?;
        }
        Some(("logout", _)) => {
            Profile::default().clear().await?;
            println!("Signed out.");
        }
        Some(("theme", subcmd_matches)) => {
            let theme = subcmd_matches.get_one::<String>("name").unwrap();
            Profile::default().set_theme(theme).await?;
            println!("Theme set to {theme}");
        }
        Some(("config", subcmd_matches)) => match subcmd_matches.subcommand() {
            Some(("create", _)) => {
                create_config_file().await?;
            }
            Some(("default", _)) => {
                println!("{}", Config::serialize_default(build()));
            }
            Some(("path", _)) => {
                println!("{}", Config::default(ConfigKey::ConfigFile));
            }
            _ => {
                subcommand_config().print_long_help()?;
            }
        },
        _ => {
            build().print_long_help()?;
        }
    }

    return Ok(());
}
