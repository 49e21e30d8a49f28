//! Library exports for the URL shortener application
//!
//! The pieces are wired together explicitly in `main`: a [`database::RedbRecords`]
//! backend and a [`generator::CodeGenerator`] are handed to a [`store::LinkStore`],
//! which the HTTP layer shares through [`handler::AppState`].

pub mod config;
pub mod database;
pub mod error;
pub mod generator;
pub mod handler;
pub mod model;
pub mod route;
pub mod storage;
pub mod store;
pub mod validation;
