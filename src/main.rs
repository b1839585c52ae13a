//! Publication mailer service entry point.

use std::sync::Arc;

use mockable::DefaultClock;
use publication_mailer::{
    config::ServiceConfig,
    publication::{
        adapters::{
            postgres::{
                PostgresDocumentRepository, PostgresOutbox, PostgresRecipientDirectory,
                PostgresTaskRepository, build_pool,
            },
            template::{MinijinjaRenderer, TemplateRegistry},
        },
        services::{PublicationPipeline, PublicationPorts},
    },
    telemetry, trigger,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    telemetry::init();

    let config = ServiceConfig::from_env()?;
    let pool = build_pool(&config.database_url)?;
    let templates = TemplateRegistry::load(&config.template_dir)?;
    info!(
        templates = templates.len(),
        dir = %config.template_dir,
        "loaded render templates"
    );

    let ports = PublicationPorts {
        tasks: Arc::new(PostgresTaskRepository::new(pool.clone())),
        documents: Arc::new(PostgresDocumentRepository::new(pool.clone())),
        recipients: Arc::new(PostgresRecipientDirectory::new(pool.clone())),
        renderer: Arc::new(MinijinjaRenderer::new(templates, config.image_host.clone())),
        outbox: Arc::new(PostgresOutbox::new(
            pool,
            config.publication.message_base_uri.clone(),
        )),
    };
    let pipeline = Arc::new(PublicationPipeline::new(
        ports,
        config.publication.clone(),
        Arc::new(DefaultClock),
    ));

    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;
    info!(address = %config.bind_address, channel = %config.publication.channel, "publication mailer listening");
    axum::serve(listener, trigger::router(pipeline)).await?;
    Ok(())
}
