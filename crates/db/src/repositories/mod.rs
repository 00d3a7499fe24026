//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod design_request_repo;
pub mod project_design_repo;
pub mod project_repo;

pub use design_request_repo::DesignRequestRepo;
pub use project_design_repo::ProjectDesignRepo;
pub use project_repo::ProjectRepo;
