pub mod cleanup;
pub mod complete_flight;
pub mod reload_boundary;
pub mod run;
pub mod validate_schema;

pub use cleanup::handle_cleanup;
pub use complete_flight::handle_complete_flight;
pub use reload_boundary::handle_reload_boundary;
pub use run::handle_run;
pub use validate_schema::handle_validate_schema;
