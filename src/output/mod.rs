//! Output formatting for management objects.
//!
//! This module handles formatting and outputting results:
//! - [`tables`] - Table and detail rendering
//! - [`terminal`] - Column and colour helpers

mod tables;
mod terminal;

pub use tables::{
    deployment_details, hosted_service_details, hosted_services_table, locations_table,
    operation_details, storage_services_table,
};
pub use terminal::{color_status, format_field};

/// Print rendered rows to stdout.
pub fn print_rows(rows: &[String]) {
    for row in rows {
        println!("{row}");
    }
}
