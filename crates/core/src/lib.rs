//! Selection, filtering and pick logic. Keep this crate free of IO and terminal concerns.

pub mod catalog;
pub mod config;
pub mod entity;
pub mod events;
pub mod filter;
pub mod notify;
pub mod random;
pub mod reveal;
pub mod rng;
pub mod selection;
pub mod session;
pub mod store;
pub mod timer;

pub use catalog::*;
pub use config::*;
pub use entity::*;
pub use events::*;
pub use filter::*;
pub use notify::*;
pub use random::*;
pub use reveal::*;
pub use rng::*;
pub use selection::*;
pub use session::*;
pub use store::*;
pub use timer::*;
