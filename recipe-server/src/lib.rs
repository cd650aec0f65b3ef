pub mod application;
pub mod data;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
pub mod server;
pub mod state;

pub use server::{build_app, start_rest_server};
pub use state::AppState;
