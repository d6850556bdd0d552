//! Transport configuration and its fail-fast validation

use serde::Deserialize;

use crate::error::ConfigurationError;

fn default_api_url() -> String {
    "https://api.brevo.com/v3/smtp/email".to_string()
}

fn default_sender_name() -> String {
    "Staffetta".to_string()
}

fn default_operator_name() -> String {
    "Operator".to_string()
}

const fn default_timeout_secs() -> u64 {
    30
}

/// Everything the transport needs to reach the provider.
///
/// Validated once per batch or immediate call — a missing or malformed
/// credential fails the whole run before any message is attempted, because
/// retrying cannot fix a configuration problem.
#[derive(Debug, Clone, Deserialize)]
pub struct TransportConfig {
    /// Provider endpoint accepting the transactional-message POST.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Provider API key, sent in the `api-key` header.
    #[serde(default)]
    pub api_key: String,

    /// Sender address; must be verified with the provider.
    #[serde(default)]
    pub sender_email: String,

    /// Display name shown as the sender.
    #[serde(default = "default_sender_name")]
    pub sender_name: String,

    /// The human operator who receives queue notifications.
    #[serde(default)]
    pub operator_email: String,

    /// Display name for the operator.
    #[serde(default = "default_operator_name")]
    pub operator_name: String,

    /// Per-request deadline in seconds.
    ///
    /// A hung provider call would otherwise stall the whole batch.
    ///
    /// Default: 30 seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key: String::new(),
            sender_email: String::new(),
            sender_name: default_sender_name(),
            operator_email: String::new(),
            operator_name: default_operator_name(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl TransportConfig {
    /// Collect every configuration finding.
    ///
    /// The health surface reports the full list; [`validate`](Self::validate)
    /// fails fast on the first.
    #[must_use]
    pub fn check(&self) -> Vec<ConfigurationError> {
        let mut findings = Vec::new();

        if self.api_key.is_empty() {
            findings.push(ConfigurationError::MissingApiKey);
        }

        if self.sender_email.is_empty() {
            findings.push(ConfigurationError::MissingSenderAddress);
        } else if !is_email_shaped(&self.sender_email) {
            findings.push(ConfigurationError::InvalidSenderAddress(
                self.sender_email.clone(),
            ));
        }

        if self.operator_email.is_empty() {
            findings.push(ConfigurationError::MissingOperatorAddress);
        } else if !is_email_shaped(&self.operator_email) {
            findings.push(ConfigurationError::InvalidOperatorAddress(
                self.operator_email.clone(),
            ));
        }

        findings
    }

    /// Fail fast on the first configuration problem.
    ///
    /// # Errors
    /// Returns the first finding from [`check`](Self::check).
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        match self.check().into_iter().next() {
            Some(finding) => Err(finding),
            None => Ok(()),
        }
    }
}

/// Shape check for an email address: `local@domain`, no whitespace, domain
/// containing an interior dot. Deliverability is the provider's problem;
/// this only catches obviously broken configuration.
#[must_use]
pub fn is_email_shaped(address: &str) -> bool {
    if address.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = address.split_once('@') else {
        return false;
    };

    if local.is_empty() || domain.contains('@') {
        return false;
    }

    let domain = domain.as_bytes();
    domain.len() >= 3 && domain[1..domain.len() - 1].contains(&b'.')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> TransportConfig {
        TransportConfig {
            api_key: "xkeysib-123".to_string(),
            sender_email: "noreply@example.com".to_string(),
            operator_email: "operator@example.com".to_string(),
            ..TransportConfig::default()
        }
    }

    #[test]
    fn valid_configuration_passes() {
        assert!(valid_config().validate().is_ok());
        assert!(valid_config().check().is_empty());
    }

    #[test]
    fn missing_fields_are_all_reported() {
        let findings = TransportConfig::default().check();
        assert_eq!(
            findings,
            vec![
                ConfigurationError::MissingApiKey,
                ConfigurationError::MissingSenderAddress,
                ConfigurationError::MissingOperatorAddress,
            ]
        );
    }

    #[test]
    fn validate_returns_the_first_finding() {
        let config = TransportConfig {
            sender_email: "noreply@example.com".to_string(),
            operator_email: "operator@example.com".to_string(),
            ..TransportConfig::default()
        };
        assert_eq!(
            config.validate().unwrap_err(),
            ConfigurationError::MissingApiKey
        );
    }

    #[test]
    fn malformed_addresses_are_flagged() {
        let config = TransportConfig {
            sender_email: "not-an-address".to_string(),
            ..valid_config()
        };
        assert_eq!(
            config.validate().unwrap_err(),
            ConfigurationError::InvalidSenderAddress("not-an-address".to_string())
        );

        let config = TransportConfig {
            operator_email: "two@at@signs.example".to_string(),
            ..valid_config()
        };
        assert_eq!(
            config.validate().unwrap_err(),
            ConfigurationError::InvalidOperatorAddress("two@at@signs.example".to_string())
        );
    }

    #[test]
    fn email_shape_check() {
        assert!(is_email_shaped("user@example.com"));
        assert!(is_email_shaped("user.name+tag@sub.example.co"));

        assert!(!is_email_shaped(""));
        assert!(!is_email_shaped("no-at-sign"));
        assert!(!is_email_shaped("@example.com"));
        assert!(!is_email_shaped("user@"));
        assert!(!is_email_shaped("user@nodot"));
        assert!(!is_email_shaped("user@.com"));
        assert!(!is_email_shaped("user@com."));
        assert!(!is_email_shaped("user name@example.com"));
        assert!(!is_email_shaped("user@exa mple.com"));
    }

    #[test]
    fn serde_defaults_fill_optional_fields() {
        let config: TransportConfig =
            serde_json::from_str(r#"{"api_key": "k", "sender_email": "a@b.co", "operator_email": "c@d.co"}"#)
                .unwrap();
        assert_eq!(config.api_url, "https://api.brevo.com/v3/smtp/email");
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.sender_name, "Staffetta");
        assert!(config.validate().is_ok());
    }
}
