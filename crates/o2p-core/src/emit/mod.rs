pub mod proto;

pub use proto::{render_proto, write_proto};
