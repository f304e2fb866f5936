use garde::Validate;
use serde::Deserialize;

use crate::error::{AppError, Result};

/// The sign-in payload.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SignInRequest {
    /// The account email address.
    #[garde(email)]
    pub email: String,
    /// The account password.
    #[garde(length(min = 8, max = 128))]
    pub password: String,
    /// Accepted as a UI affordance only; token lifetime is owned by the
    /// issuer's configuration.
    #[garde(skip)]
    #[serde(default)]
    pub remember_me: bool,
}

/// Validates a sign-in payload before it reaches the issuer.
///
/// # Arguments
///
/// * `request` - The payload to validate.
///
/// # Returns
///
/// A `Result<()>` indicating whether the payload is valid.
pub fn validate_sign_in(request: &SignInRequest) -> Result<()> {
    request
        .validate()
        .map_err(|report| AppError::Validation(report.to_string()))
}
