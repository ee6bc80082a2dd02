mod chat;
mod completion;
mod folder;
mod identity;
mod message;
mod record;
mod store;

pub use chat::*;
pub use completion::*;
pub use folder::*;
pub use identity::*;
pub use message::*;
pub use record::*;
pub use store::*;
