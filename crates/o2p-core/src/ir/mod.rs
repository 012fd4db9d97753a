pub mod messages;
pub mod services;
pub mod types;

pub use messages::*;
pub use services::*;
pub use types::{FileOption, ProtoFile};
