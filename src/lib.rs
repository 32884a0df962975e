//! Booklist: a JSON REST API for books, movies and shows over a document store.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod serializer;
pub mod services;
pub mod state;
pub mod store;
