//! Integration tests
//!
//! Database-backed tests are ignored by default. Run them against a
//! PostgreSQL server with:
//! `DATABASE_URL=postgres://... cargo test --test integration -- --ignored`

mod api_tests;
mod audit_tests;
mod fines_tests;
mod lending_tests;
mod reviews_tests;
