//! Built-in provider adapters.

pub mod auspost;
pub mod sendgrid;
pub mod slack;
pub mod stripe;
pub mod xero;

pub use auspost::AustraliaPostAdapter;
pub use sendgrid::SendGridAdapter;
pub use slack::SlackAdapter;
pub use stripe::StripeAdapter;
pub use xero::XeroAdapter;

use crate::error::AdapterError;

/// A required credential field must be present and non-empty.
fn require<'a>(value: &'a str, provider: &str) -> Result<&'a str, AdapterError> {
    if value.trim().is_empty() {
        return Err(AdapterError::invalid_configuration(provider));
    }
    Ok(value)
}
