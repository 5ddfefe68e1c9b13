// Biblioteca raíz del crate `courseshare`: portal de materiales de curso.
// Reexporta los módulos principales y `run_server`, que arranca la API.
pub mod api_json;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod server;
pub mod upload;

/// Ejecuta el servidor HTTP (reexport para facilitar uso desde `main`)
pub use server::run_server;
