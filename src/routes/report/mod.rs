mod handler;
pub mod model;

pub use handler::{create, get_by_id, list, update_status};
