mod contact;
mod import;
mod list;

pub use contact::*;
pub use import::*;
pub use list::*;
