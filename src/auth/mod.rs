//! API credential storage: platform keyring first, environment as fallback.

use std::error::Error;
use std::io::BufRead;

use tracing::{debug, warn};

use crate::core::gateway::ModelGateway;
use crate::core::keyring::{self, KeyringAccessError};

mod ui;

use self::ui::{print_auth_banner, prompt_confirmation, prompt_token, ConfirmationChoice};

pub const API_KEY_ENV: &str = "XAI_API_KEY";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Keyring,
    Environment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCredential {
    pub secret: String,
    pub source: CredentialSource,
}

pub struct CredentialStore {
    use_keyring: bool,
    env_var: String,
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::new_with_keyring(true)
    }

    /// Construct a store, optionally disabling keyring access (useful for tests)
    pub fn new_with_keyring(use_keyring: bool) -> Self {
        Self {
            use_keyring,
            env_var: API_KEY_ENV.to_string(),
        }
    }

    pub fn with_env_var(mut self, name: impl Into<String>) -> Self {
        self.env_var = name.into();
        self
    }

    pub fn uses_keyring(&self) -> bool {
        self.use_keyring
    }

    /// Find the credential to use.
    ///
    /// A temporarily unavailable keyring falls through to the environment;
    /// permanent keyring failures are returned.
    pub fn resolve(&self) -> Result<Option<ResolvedCredential>, KeyringAccessError> {
        if self.use_keyring {
            match keyring::read_secret() {
                Ok(Some(secret)) if !secret.trim().is_empty() => {
                    debug!("Using API key from keyring");
                    return Ok(Some(ResolvedCredential {
                        secret: secret.trim().to_string(),
                        source: CredentialSource::Keyring,
                    }));
                }
                Ok(_) => {}
                Err(err) if err.is_recoverable() => {
                    warn!(error = %err, "Keyring unavailable; falling back to environment");
                }
                Err(err) => return Err(err),
            }
        }

        Ok(std::env::var(&self.env_var)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(|secret| {
                debug!(variable = %self.env_var, "Using API key from environment");
                ResolvedCredential {
                    secret,
                    source: CredentialSource::Environment,
                }
            }))
    }

    pub fn store(&self, secret: &str) -> Result<(), KeyringAccessError> {
        if !self.use_keyring {
            return Ok(());
        }
        keyring::write_secret(secret.trim())
    }

    /// Remove the stored key. Returns whether one existed.
    pub fn remove(&self) -> Result<bool, KeyringAccessError> {
        if !self.use_keyring {
            return Ok(false);
        }
        keyring::delete_secret()
    }

    /// Prompt for a key, check it against the API and store it when accepted.
    pub async fn interactive_auth(
        &self,
        gateway: &ModelGateway,
        input: &mut impl BufRead,
    ) -> Result<(), Box<dyn Error>> {
        let configured = matches!(
            self.resolve()?,
            Some(ResolvedCredential {
                source: CredentialSource::Keyring,
                ..
            })
        );
        print_auth_banner(configured);

        let token = prompt_token(input)?;
        println!("Checking the key against {}...", gateway.base_url());
        if !gateway.validate_credential(&token).await? {
            return Err("The API key was rejected by the API".into());
        }

        self.store(&token)?;
        println!("✓ API key stored securely");
        if !self.use_keyring {
            println!("(keyring disabled; the key was not persisted)");
        }
        Ok(())
    }

    pub fn interactive_deauth(&self, input: &mut impl BufRead) -> Result<(), Box<dyn Error>> {
        println!("🗑️  Causerie Authentication Removal");
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        println!();

        if prompt_confirmation("Remove the stored API key?", input)? == ConfirmationChoice::No {
            println!("Cancelled.");
            return Ok(());
        }

        if self.remove()? {
            println!("✓ API key removed");
        } else {
            println!("No stored API key found.");
        }
        if std::env::var(&self.env_var).is_ok() {
            println!("Note: {} is still set in your environment.", self.env_var);
        }
        Ok(())
    }
}
