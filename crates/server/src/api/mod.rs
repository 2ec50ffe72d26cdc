pub mod error;
pub mod games;
pub mod handlers;
pub mod jobs;
pub mod middleware;
pub mod paths;
pub mod routes;

pub use routes::create_router;
