//! Integration tests over the in-memory store, the HTTP router and (ignored
//! by default) a live Postgres database.

mod common;
mod loader;
mod postgres;
mod purge;
mod reservations;
