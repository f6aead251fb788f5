pub mod organization;

pub use organization::{OrganizationId, require_organization};
