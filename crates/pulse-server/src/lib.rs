//! Carbon Pulse server — axum routes, shared state and map annotation for the
//! `carbon-pulse` binary.

pub mod error;
pub mod map;
pub mod routes;
pub mod state;

pub use routes::build_router;
pub use state::AppState;
