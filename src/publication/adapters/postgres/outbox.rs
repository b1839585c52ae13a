//! `PostgreSQL` outbox.

use super::{
    models::message_to_row,
    pool::{PublicationPgPool, run_blocking},
    schema::outbox_messages,
};
use crate::publication::{
    domain::OutboxMessage,
    ports::{Outbox, OutboxError, OutboxResult},
};
use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL`-backed outbox writing one row per message.
#[derive(Debug, Clone)]
pub struct PostgresOutbox {
    pool: PublicationPgPool,
    base_uri: String,
}

impl PostgresOutbox {
    /// Creates an outbox minting message URIs under `base_uri`.
    #[must_use]
    pub fn new(pool: PublicationPgPool, base_uri: impl Into<String>) -> Self {
        Self {
            pool,
            base_uri: base_uri.into(),
        }
    }
}

#[async_trait]
impl Outbox for PostgresOutbox {
    async fn deliver(&self, message: &OutboxMessage) -> OutboxResult<()> {
        let row = message_to_row(message, &self.base_uri).map_err(OutboxError::persistence)?;
        let message_id = message.id();
        run_blocking(&self.pool, move |connection| {
            diesel::insert_into(outbox_messages::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        OutboxError::Duplicate(message_id)
                    }
                    _ => OutboxError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }
}
