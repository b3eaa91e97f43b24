use std::{collections::HashSet, net::IpAddr};

use http::uri::Authority;

use crate::config::models::GatewayConfig;

/// Validation result type alias
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validation error types
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid field '{field}': {message}")]
    InvalidField { field: String, message: String },

    #[error("Invalid bind address '{address}': {reason}")]
    InvalidBindAddress { address: String, reason: String },

    #[error("Invalid destination '{destination}' for route '{path}': {reason}")]
    InvalidDestination {
        path: String,
        destination: String,
        reason: String,
    },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },
}

/// Gateway configuration validator
pub struct GatewayConfigValidator;

impl GatewayConfigValidator {
    /// Validate the entire gateway configuration, reporting every problem found.
    pub fn validate(config: &GatewayConfig) -> ValidationResult<()> {
        let errors = Self::collect_errors(config);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::ValidationFailed {
                message: Self::format_multiple_errors(errors),
            })
        }
    }

    /// Run every check and return the individual failures.
    pub fn collect_errors(config: &GatewayConfig) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if let Some(ip) = &config.bind_ip {
            if let Err(e) = Self::validate_bind_ip(ip) {
                errors.push(e);
            }
        }

        if config.max_body_bytes == 0 {
            errors.push(ValidationError::InvalidField {
                field: "max_body_bytes".to_string(),
                message: "Must be greater than zero".to_string(),
            });
        }

        if let Some(dir) = &config.output_dir {
            if dir.exists() && !dir.is_dir() {
                errors.push(ValidationError::InvalidField {
                    field: "output_dir".to_string(),
                    message: format!("'{}' exists but is not a directory", dir.display()),
                });
            }
        }

        if config.routes.is_empty() {
            errors.push(ValidationError::MissingField {
                field: "routes".to_string(),
            });
        }

        for (path, destinations) in &config.routes {
            errors.extend(Self::validate_route(path, destinations));
        }

        errors
    }

    fn validate_bind_ip(address: &str) -> ValidationResult<()> {
        address
            .parse::<IpAddr>()
            .map(|_| ())
            .map_err(|e| ValidationError::InvalidBindAddress {
                address: address.to_string(),
                reason: format!("Must be an IPv4 or IPv6 address ({e})"),
            })
    }

    fn validate_route(path: &str, destinations: &[String]) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if !path.starts_with('/') {
            errors.push(ValidationError::InvalidField {
                field: format!("route path: {path}"),
                message: "Route paths must start with '/'".to_string(),
            });
        }

        if destinations.is_empty() {
            errors.push(ValidationError::InvalidField {
                field: format!("route '{path}' destinations"),
                message: "Routes must have at least one destination".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for destination in destinations {
            if let Err(e) = Self::validate_destination(path, destination) {
                errors.push(e);
            }
            if !seen.insert(destination.as_str()) {
                errors.push(ValidationError::InvalidDestination {
                    path: path.to_string(),
                    destination: destination.clone(),
                    reason: "Listed more than once".to_string(),
                });
            }
        }

        errors
    }

    /// A destination is a bare `host[:port]` authority: no scheme, path or credentials.
    fn validate_destination(path: &str, destination: &str) -> ValidationResult<()> {
        let invalid = |reason: String| ValidationError::InvalidDestination {
            path: path.to_string(),
            destination: destination.to_string(),
            reason,
        };

        if destination.contains("://") {
            return Err(invalid(
                "Must be host[:port] without a scheme (requests are sent over http)".to_string(),
            ));
        }

        let authority = destination
            .parse::<Authority>()
            .map_err(|e| invalid(e.to_string()))?;

        if authority.as_str().contains('@') {
            return Err(invalid("Credentials are not supported".to_string()));
        }
        if authority.host().is_empty() {
            return Err(invalid("Host is empty".to_string()));
        }
        // Anything after the host is a port section and must be a valid u16.
        if authority.as_str().len() > authority.host().len() && authority.port_u16().is_none() {
            return Err(invalid("Port must be a number between 0 and 65535".to_string()));
        }

        Ok(())
    }

    fn format_multiple_errors(errors: Vec<ValidationError>) -> String {
        if errors.len() == 1 {
            return errors[0].to_string();
        }

        let mut message = format!("Found {} configuration errors:", errors.len());
        for (i, error) in errors.iter().enumerate() {
            message.push_str(&format!("\n  {}. {}", i + 1, error));
        }
        message
    }
}
