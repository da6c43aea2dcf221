//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check endpoint URLs parse
//! - Warn on half-configured TLS (one certificate path without the other)
//! - Validate value ranges (commit timeout > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function over the loaded records
//! - Runs before config is accepted into the client

use std::fmt;

use crate::config::schema::{ClientConfig, Settings};

/// A single semantic violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a client record together with its settings.
pub fn validate_config(client: &ClientConfig, settings: &Settings) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if client.username.trim().is_empty() {
        errors.push(ValidationError::new("username", "must not be empty"));
    }

    for (field, value) in [
        ("peerGrpcUrl", &client.peer_grpc_url),
        ("peerEventUrl", &client.peer_event_url),
        ("ordererUrl", &client.orderer_url),
    ] {
        if value.is_empty() {
            errors.push(ValidationError::new(field, "must not be empty"));
        } else if let Err(e) = url::Url::parse(value) {
            errors.push(ValidationError::new(field, format!("invalid URL '{}': {}", value, e)));
        }
    }

    if client.tls_peer_path.is_empty() != client.tls_orderer_path.is_empty() {
        tracing::warn!(
            tls_peer_path = %client.tls_peer_path,
            tls_orderer_path = %client.tls_orderer_path,
            "Only one TLS certificate path set; using plaintext endpoints"
        );
    }

    if settings.commit_timeout_ms == 0 {
        errors.push(ValidationError::new("commit_timeout_ms", "must be greater than zero"));
    }

    if settings.msp_id.is_empty() {
        errors.push(ValidationError::new("msp_id", "must not be empty"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_client() -> ClientConfig {
        ClientConfig {
            username: "user1".into(),
            peer_grpc_url: "grpc://localhost:7051".into(),
            peer_event_url: "grpc://localhost:7053".into(),
            orderer_url: "grpc://localhost:7050".into(),
            tls_peer_path: String::new(),
            tls_orderer_path: String::new(),
            path: "hfc-key-store".into(),
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(validate_config(&valid_client(), &Settings::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut client = valid_client();
        client.username = " ".into();
        client.orderer_url = "not a url".into();
        client.tls_peer_path = "peer.pem".into();

        let mut settings = Settings::default();
        settings.commit_timeout_ms = 0;

        let errors = validate_config(&client, &settings).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["username", "ordererUrl", "commit_timeout_ms"]);
    }

    #[test]
    fn test_single_tls_path_is_not_an_error() {
        let mut client = valid_client();
        client.tls_peer_path = "peer.pem".into();

        assert!(validate_config(&client, &Settings::default()).is_ok());
        assert!(!client.secure());
    }
}
