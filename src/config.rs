//! Service configuration.
//!
//! Configuration is read once at start-up into immutable values; the
//! pipeline receives a [`PublicationConfig`] at construction and never looks
//! at the environment itself.

use camino::Utf8PathBuf;
use std::net::SocketAddr;
use std::num::NonZeroUsize;
use thiserror::Error;

use crate::publication::domain::{ChannelUri, EmailAddress, FolderUri, MessageEnvelope};

/// Mailing-list distribution channel.
pub const DEFAULT_CHANNEL: &str =
    "http://themis.vlaanderen.be/id/publicatiekanaal/c184f026-feaa-4899-ba06-fd3a03df599c";

/// Default maximum number of blind-copy recipients per message.
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Default base URI for minted message resources.
pub const DEFAULT_MESSAGE_BASE_URI: &str = "http://themis.vlaanderen.be/id/emails/";

const DEFAULT_IMAGE_HOST: &str = "http://localhost";
const DEFAULT_TEMPLATE_DIR: &str = "/share/templates";
const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:80";

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is not set.
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),

    /// A variable is set to an unusable value.
    #[error("invalid value for {key}: {message}")]
    Invalid {
        /// Variable name.
        key: &'static str,
        /// Why the value was rejected.
        message: String,
    },
}

/// Settings consumed by the publication pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicationConfig {
    /// Channel whose tasks this service processes.
    pub channel: ChannelUri,
    /// Maximum recipients per outbound message.
    pub batch_size: NonZeroUsize,
    /// Sender, primary recipient and outbox folder for every message.
    pub envelope: MessageEnvelope,
    /// Base URI message resources are minted under.
    pub message_base_uri: String,
}

impl PublicationConfig {
    /// Creates a configuration minting messages under the default base URI.
    #[must_use]
    pub fn new(envelope: MessageEnvelope, batch_size: NonZeroUsize, channel: ChannelUri) -> Self {
        Self {
            channel,
            batch_size,
            envelope,
            message_base_uri: DEFAULT_MESSAGE_BASE_URI.to_owned(),
        }
    }
}

/// Full service configuration, including process-level settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Pipeline settings.
    pub publication: PublicationConfig,
    /// Address the HTTP trigger listens on.
    pub bind_address: SocketAddr,
    /// `PostgreSQL` connection string.
    pub database_url: String,
    /// Directory holding render templates and their manifest.
    pub template_dir: Utf8PathBuf,
    /// Host prefixed to image links in rendered documents.
    pub image_host: String,
}

impl ServiceConfig {
    /// Reads configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a required variable is missing or a
    /// value cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a required key is missing or a value
    /// cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let required = |key: &'static str| read(key).ok_or(ConfigError::Missing(key));

        let channel_raw = read("PUBLICATION_CHANNEL").unwrap_or_else(|| DEFAULT_CHANNEL.to_owned());
        let channel =
            ChannelUri::new(channel_raw).map_err(|err| invalid("PUBLICATION_CHANNEL", &err))?;

        let batch_size = match read("BATCH_SIZE") {
            Some(raw) => raw
                .trim()
                .parse::<NonZeroUsize>()
                .map_err(|err| invalid("BATCH_SIZE", &err))?,
            None => NonZeroUsize::new(DEFAULT_BATCH_SIZE).ok_or(ConfigError::Invalid {
                key: "BATCH_SIZE",
                message: "default batch size must be positive".to_owned(),
            })?,
        };

        let sender =
            EmailAddress::new(required("EMAIL_FROM")?).map_err(|err| invalid("EMAIL_FROM", &err))?;
        let to = EmailAddress::new(required("EMAIL_TO")?).map_err(|err| invalid("EMAIL_TO", &err))?;
        let folder =
            FolderUri::new(required("OUTBOX_URI")?).map_err(|err| invalid("OUTBOX_URI", &err))?;

        let bind_raw = read("BIND_ADDRESS").unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_owned());
        let bind_address = bind_raw
            .trim()
            .parse::<SocketAddr>()
            .map_err(|err| invalid("BIND_ADDRESS", &err))?;

        Ok(Self {
            publication: PublicationConfig {
                channel,
                batch_size,
                envelope: MessageEnvelope { sender, to, folder },
                message_base_uri: read("EMAIL_BASE_URI")
                    .unwrap_or_else(|| DEFAULT_MESSAGE_BASE_URI.to_owned()),
            },
            bind_address,
            database_url: required("DATABASE_URL")?,
            template_dir: Utf8PathBuf::from(
                read("TEMPLATE_DIR").unwrap_or_else(|| DEFAULT_TEMPLATE_DIR.to_owned()),
            ),
            image_host: read("IMAGE_HOST").unwrap_or_else(|| DEFAULT_IMAGE_HOST.to_owned()),
        })
    }
}

fn invalid(key: &'static str, err: &impl std::fmt::Display) -> ConfigError {
    ConfigError::Invalid {
        key,
        message: err.to_string(),
    }
}
