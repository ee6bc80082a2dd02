mod profile;
mod workspace;

pub use profile::*;
pub use workspace::*;
