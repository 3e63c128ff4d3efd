//! # SQL Query Vet Library
//!
//! Rule compilation, database checks and the evaluation loop behind the
//! `sql-query-vet` binary.
//!
//! - [`config`] - sqlc configuration loading and validation
//! - [`catalog`] - Query files to per-group query catalogs
//! - [`rules`] - Rule compilation and evaluation
//! - [`model`] - Values exposed to rule expressions
//! - [`database`] - Prepare and EXPLAIN capabilities per engine
//! - [`vet`] - The evaluation loop
//! - [`output`] - Report rendering
//! - [`app`] - The `vet` command

pub mod app;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod model;
pub mod output;
pub mod rules;
pub mod vet;
