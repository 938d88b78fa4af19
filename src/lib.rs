pub mod app;
pub mod authz;
pub mod db;
pub mod docs;
pub mod errors;
pub mod events;
pub mod jwt;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;
pub mod validation;

pub use app::create_app;
