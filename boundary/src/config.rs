//! Provider configuration
//!
//! Every provider attribute falls back to a `BOUNDARY_*` environment
//! variable when it is not set in the provider block.

use tfplug::types::{AttributePath, Diagnostic, DynamicValue};
use url::Url;

pub const ENV_ADDR: &str = "BOUNDARY_ADDR";
pub const ENV_TOKEN: &str = "BOUNDARY_TOKEN";
pub const ENV_AUTH_METHOD_ID: &str = "BOUNDARY_AUTH_METHOD_ID";
pub const ENV_LOGIN_NAME: &str = "BOUNDARY_AUTH_METHOD_LOGIN_NAME";
pub const ENV_PASSWORD: &str = "BOUNDARY_AUTH_METHOD_PASSWORD";
pub const ENV_TLS_INSECURE: &str = "BOUNDARY_TLS_INSECURE";

/// How the provider obtains its bearer token
#[derive(Clone, PartialEq)]
pub enum Credentials {
    Token(String),
    Password {
        auth_method_id: String,
        login_name: String,
        password: String,
    },
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::Token(_) => f.write_str("Token(..)"),
            Credentials::Password {
                auth_method_id,
                login_name,
                ..
            } => f
                .debug_struct("Password")
                .field("auth_method_id", auth_method_id)
                .field("login_name", login_name)
                .finish_non_exhaustive(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSettings {
    pub addr: String,
    pub credentials: Credentials,
    pub tls_insecure: bool,
}

impl ProviderSettings {
    /// Resolve settings from the provider block and the process environment
    pub fn from_config(config: &DynamicValue) -> Result<Self, Vec<Diagnostic>> {
        Self::resolve(config, |key| std::env::var(key).ok())
    }

    /// Resolve settings with `env` standing in for the environment
    pub fn resolve(
        config: &DynamicValue,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, Vec<Diagnostic>> {
        let mut diagnostics = vec![];

        let mut string = |name: &str, env_key: &str| -> Option<String> {
            match config.get_optional_string(&AttributePath::new(name)) {
                Ok(Some(value)) if !value.is_empty() => Some(value),
                Ok(_) => env(env_key).filter(|v| !v.is_empty()),
                Err(e) => {
                    diagnostics.push(
                        Diagnostic::error("Invalid provider configuration", e.to_string())
                            .with_attribute(AttributePath::new(name)),
                    );
                    None
                }
            }
        };

        let addr = string("addr", ENV_ADDR);
        let token = string("token", ENV_TOKEN);
        let auth_method_id = string("auth_method_id", ENV_AUTH_METHOD_ID);
        let login_name = string("auth_method_login_name", ENV_LOGIN_NAME);
        let password = string("auth_method_password", ENV_PASSWORD);
        let tls_insecure_env = env(ENV_TLS_INSECURE).filter(|v| !v.is_empty());

        let tls_insecure = match config.get_optional_bool(&AttributePath::new("tls_insecure")) {
            Ok(Some(value)) => value,
            Ok(None) => match tls_insecure_env.as_deref().map(str::parse::<bool>) {
                Some(Ok(value)) => value,
                Some(Err(_)) => {
                    diagnostics.push(Diagnostic::error(
                        "Invalid provider configuration",
                        format!("{} must be \"true\" or \"false\"", ENV_TLS_INSECURE),
                    ));
                    false
                }
                None => false,
            },
            Err(e) => {
                diagnostics.push(
                    Diagnostic::error("Invalid provider configuration", e.to_string())
                        .with_attribute(AttributePath::new("tls_insecure")),
                );
                false
            }
        };

        let addr = match addr {
            Some(addr) => match validate_addr(&addr) {
                Ok(()) => Some(addr),
                Err(detail) => {
                    diagnostics.push(
                        Diagnostic::error("Invalid Boundary address", detail)
                            .with_attribute(AttributePath::new("addr")),
                    );
                    None
                }
            },
            None => {
                diagnostics.push(
                    Diagnostic::error(
                        "addr is required",
                        format!("Set addr in the provider block or the {} environment variable", ENV_ADDR),
                    )
                    .with_attribute(AttributePath::new("addr")),
                );
                None
            }
        };

        let credentials = match (token, auth_method_id, login_name, password) {
            (Some(_), Some(_), _, _) | (Some(_), _, Some(_), _) => {
                diagnostics.push(Diagnostic::error(
                    "Conflicting credentials",
                    "Configure either token or auth_method_id with login name and password, not both",
                ));
                None
            }
            (Some(token), None, None, _) => Some(Credentials::Token(token)),
            (None, Some(auth_method_id), Some(login_name), Some(password)) => {
                Some(Credentials::Password {
                    auth_method_id,
                    login_name,
                    password,
                })
            }
            (None, None, None, _) => {
                diagnostics.push(Diagnostic::error(
                    "Missing credentials",
                    format!(
                        "Set token ({}) or auth_method_id, auth_method_login_name and auth_method_password",
                        ENV_TOKEN
                    ),
                ));
                None
            }
            (None, ..) => {
                diagnostics.push(Diagnostic::error(
                    "Incomplete password credentials",
                    "auth_method_id, auth_method_login_name and auth_method_password must all be set",
                ));
                None
            }
        };

        match (addr, credentials) {
            (Some(addr), Some(credentials)) if diagnostics.is_empty() => Ok(Self {
                addr,
                credentials,
                tls_insecure,
            }),
            _ => Err(diagnostics),
        }
    }
}

fn validate_addr(addr: &str) -> Result<(), String> {
    let url = Url::parse(addr).map_err(|e| format!("\"{}\" is not a valid URL: {}", addr, e))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!("\"{}\" must use http or https, not {}", addr, other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tfplug::types::Dynamic;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn token_from_config() {
        let config = DynamicValue::from_pairs([
            ("addr", Dynamic::from("https://boundary.example.com:9200")),
            ("token", Dynamic::from("at_1234567890_abc")),
        ]);

        let settings = ProviderSettings::resolve(&config, env(&[])).unwrap();
        assert_eq!(settings.addr, "https://boundary.example.com:9200");
        assert_eq!(settings.credentials, Credentials::Token("at_1234567890_abc".into()));
        assert!(!settings.tls_insecure);
    }

    #[test]
    fn config_wins_over_environment() {
        let config = DynamicValue::from_pairs([("addr", Dynamic::from("http://config:9200"))]);
        let settings = ProviderSettings::resolve(
            &config,
            env(&[
                (ENV_ADDR, "http://env:9200"),
                (ENV_AUTH_METHOD_ID, "ampw_1234567890"),
                (ENV_LOGIN_NAME, "admin"),
                (ENV_PASSWORD, "password"),
                (ENV_TLS_INSECURE, "true"),
            ]),
        )
        .unwrap();

        assert_eq!(settings.addr, "http://config:9200");
        assert!(settings.tls_insecure);
        assert!(matches!(
            settings.credentials,
            Credentials::Password { ref login_name, .. } if login_name == "admin"
        ));
    }

    #[test]
    fn rejects_non_http_addr() {
        let config = DynamicValue::from_pairs([
            ("addr", Dynamic::from("ftp://boundary")),
            ("token", Dynamic::from("at_x")),
        ]);
        let diagnostics = ProviderSettings::resolve(&config, env(&[])).unwrap_err();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some(AttributePath::new("addr")));
    }

    #[test]
    fn requires_addr_and_credentials() {
        let diagnostics = ProviderSettings::resolve(&DynamicValue::null(), env(&[])).unwrap_err();
        let summaries: Vec<_> = diagnostics.iter().map(|d| d.summary.as_str()).collect();
        assert_eq!(summaries, vec!["addr is required", "Missing credentials"]);
    }

    #[test]
    fn rejects_token_and_password_together() {
        let config = DynamicValue::from_pairs([
            ("addr", Dynamic::from("http://127.0.0.1:9200")),
            ("token", Dynamic::from("at_x")),
            ("auth_method_id", Dynamic::from("ampw_1234567890")),
        ]);
        let diagnostics = ProviderSettings::resolve(&config, env(&[])).unwrap_err();
        assert_eq!(diagnostics[0].summary, "Conflicting credentials");
    }

    #[test]
    fn incomplete_password_credentials() {
        let config = DynamicValue::from_pairs([
            ("addr", Dynamic::from("http://127.0.0.1:9200")),
            ("auth_method_id", Dynamic::from("ampw_1234567890")),
        ]);
        let diagnostics = ProviderSettings::resolve(&config, env(&[])).unwrap_err();
        assert_eq!(diagnostics[0].summary, "Incomplete password credentials");
    }

    #[test]
    fn debug_hides_secrets() {
        let credentials = Credentials::Password {
            auth_method_id: "ampw_1234567890".into(),
            login_name: "admin".into(),
            password: "hunter22".into(),
        };
        assert!(!format!("{:?}", credentials).contains("hunter22"));
        assert!(!format!("{:?}", Credentials::Token("at_secret".into())).contains("at_secret"));
    }
}
