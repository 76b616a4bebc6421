mod classify;
mod types;

pub use classify::*;
pub use types::*;
