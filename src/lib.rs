pub mod constants;
pub mod time;
pub mod models;
pub mod layout;
pub mod conflict;
pub mod delay;
pub mod history;
pub mod window;
pub mod state;
pub mod storage;

pub use state::AppState;
