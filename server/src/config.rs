use std::env;

use dotenv::dotenv;
use log::info;
use thiserror::Error;

use password_encryptor::CryptoError;

pub const DATABASE_URL_VAR: &str = "DATABASE_URL";
pub const BIND_ADDRESS_VAR: &str = "BIND_ADDRESS";
pub const LOG_FILE_VAR: &str = "LOG_FILE";
pub const PASSPHRASE_VAR: &str = "ENCRYPTOR_PASSWORD";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),
    #[error("failed to decrypt {0}: {1}")]
    Decrypt(&'static str, CryptoError),
}

/// Runtime configuration, resolved once at startup and passed into the
/// components that need it.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_address: String,
    pub log_file: String,
}

impl Config {
    /// Reads configuration from the environment (a .env file is honoured).
    /// DATABASE_URL may be stored as an `ENC(...)` token produced by the
    /// password_encryptor utility; it is decrypted here with the passphrase
    /// from ENCRYPTOR_PASSWORD before anything connects to the database.
    pub fn from_env() -> Result<Config, ConfigError> {
        dotenv().ok();
        let raw_url =
            env::var(DATABASE_URL_VAR).map_err(|_| ConfigError::MissingVar(DATABASE_URL_VAR))?;
        let database_url = if password_encryptor::is_wrapped(&raw_url) {
            info!("Decrypting {} from its ENC() form", DATABASE_URL_VAR);
            let passphrase =
                env::var(PASSPHRASE_VAR).map_err(|_| ConfigError::MissingVar(PASSPHRASE_VAR))?;
            password_encryptor::decrypt_property(&raw_url, &passphrase)
                .map_err(|e| ConfigError::Decrypt(DATABASE_URL_VAR, e))?
        } else {
            raw_url
        };

        Ok(Config {
            database_url,
            bind_address: env::var(BIND_ADDRESS_VAR)
                .unwrap_or_else(|_| String::from("127.0.0.1:8080")),
            log_file: env::var(LOG_FILE_VAR).unwrap_or_else(|_| String::from("logs/server.log")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // The whole env round trip lives in one test; env vars are process-wide
    // and splitting it would race under the parallel test runner.
    #[test]
    fn from_env_resolves_encrypted_database_url() {
        let token = password_encryptor::encrypt("postgres://user:pw@localhost/records", "hunter2")
            .unwrap();
        env::set_var(DATABASE_URL_VAR, password_encryptor::wrap(&token));
        env::set_var(PASSPHRASE_VAR, "hunter2");
        env::remove_var(BIND_ADDRESS_VAR);

        let config = Config::from_env().unwrap();
        assert_eq!(config.database_url, "postgres://user:pw@localhost/records");
        assert_eq!(config.bind_address, "127.0.0.1:8080");

        // A plaintext URL passes through untouched.
        env::set_var(DATABASE_URL_VAR, "postgres://localhost/records");
        let config = Config::from_env().unwrap();
        assert_eq!(config.database_url, "postgres://localhost/records");

        // A wrapped URL without a passphrase is a configuration error.
        env::set_var(DATABASE_URL_VAR, password_encryptor::wrap(&token));
        env::remove_var(PASSPHRASE_VAR);
        match Config::from_env() {
            Err(ConfigError::MissingVar(var)) => assert_eq!(var, PASSPHRASE_VAR),
            other => panic!("expected MissingVar, got {:?}", other.map(|c| c.database_url)),
        }

        env::remove_var(DATABASE_URL_VAR);
    }
}
