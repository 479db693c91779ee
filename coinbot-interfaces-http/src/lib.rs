// Coinbot HTTP Interface

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;

#[cfg(test)]
mod testing;

pub use error::*;
pub use handlers::*;
pub use middleware::*;
pub use routes::*;
