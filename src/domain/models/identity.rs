use serde_derive::Deserialize;
use serde_derive::Serialize;

/// The signed-in user as handed over by the external login flow. Only
/// consumed for message attribution and greetings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub avatar_url: String,
}

impl UserIdentity {
    pub fn named(name: &str) -> UserIdentity {
        return UserIdentity {
            name: name.to_string(),
            email: "".to_string(),
            avatar_url: "".to_string(),
        };
    }

    pub fn display_name(&self) -> String {
        if self.name.trim().is_empty() {
            return "there".to_string();
        }

        return self.name.clone();
    }
}
