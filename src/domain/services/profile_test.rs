use std::env;
use std::path::PathBuf;

use uuid::Uuid;

use super::Profile;
use super::StoredProfile;
use crate::domain::models::UserIdentity;

fn temp_profile() -> Profile {
    let dir = env::temp_dir().join(format!("granary-test-{}", Uuid::new_v4().simple()));
    return Profile::new(PathBuf::from(dir));
}

#[tokio::test]
async fn it_returns_none_when_no_profile_is_saved() {
    let profile = temp_profile();
    let loaded = profile.load().await.unwrap();

    assert_eq!(loaded, None);
}

#[tokio::test]
async fn it_saves_and_reloads_a_profile() {
    let profile = temp_profile();
    let stored = StoredProfile {
        identity: UserIdentity {
            name: "Sam".to_string(),
            email: "sam@example.com".to_string(),
            avatar_url: "".to_string(),
        },
        theme: "dark".to_string(),
    };

    profile.save(&stored).await.unwrap();
    let loaded = profile.load().await.unwrap().unwrap();

    assert_eq!(loaded, stored);
}

#[tokio::test]
async fn it_sets_the_theme_without_losing_the_identity() {
    let profile = temp_profile();
    profile
        .save(&StoredProfile {
            identity: UserIdentity::named("Sam"),
            theme: "light".to_string(),
        })
        .await
        .unwrap();

    profile.set_theme("dark").await.unwrap();
    let loaded = profile.load().await.unwrap().unwrap();

    assert_eq!(loaded.theme, "dark");
    assert_eq!(loaded.identity.name, "Sam");
}

#[tokio::test]
async fn it_sets_the_theme_on_a_fresh_profile() {
    let profile = temp_profile();
    profile.set_theme("dark").await.unwrap();
    let loaded = profile.load().await.unwrap().unwrap();

    assert_eq!(loaded.theme, "dark");
    assert_eq!(loaded.identity, UserIdentity::default());
}

#[tokio::test]
async fn it_clears_a_saved_profile() {
    let profile = temp_profile();
    profile
        .save(&StoredProfile {
            identity: UserIdentity::named("Sam"),
            theme: "".to_string(),
        })
        .await
        .unwrap();

    profile.clear().await.unwrap();
    assert_eq!(profile.load().await.unwrap(), None);

    // Clearing twice is fine.
    profile.clear().await.unwrap();
}
