pub mod handlers;
pub mod operation;
pub mod session;
pub mod state;
