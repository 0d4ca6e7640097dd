mod handler;
pub mod model;

pub use handler::{create, delete, get_by_id, list_available, list_mine, update_status};
