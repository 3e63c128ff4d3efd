//! Application logic for the SQL Query Vet CLI.
//!
//! Kept apart from the binary entry point so commands can be driven from
//! tests with a fake [`Connector`](crate::database::Connector).

mod convert;
mod helpers;
mod types;
mod vet;

pub use convert::convert_format;
pub use helpers::{calculate_exit_code, create_output_options};
pub use types::{VetParams, VetResult};
pub use vet::{run_vet, run_vet_with};
