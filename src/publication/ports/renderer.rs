//! Rendering port turning task data into a distributable document.

use crate::publication::domain::{OrganizationUri, SourceDetails};
use chrono::NaiveDate;
use thiserror::Error;

/// Input for rendering one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    /// Organization whose template is used.
    pub creator: OrganizationUri,
    /// Document title.
    pub title: String,
    /// Document body.
    pub body: String,
    /// Creator display name, if known.
    pub creator_name: Option<String>,
    /// Channel-filtered source contacts.
    pub sources: Vec<SourceDetails>,
    /// Publication date printed in the document.
    pub date: NaiveDate,
}

/// Rendered document ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument(String);

impl RenderedDocument {
    /// Wraps rendered output.
    #[must_use]
    pub const fn new(content: String) -> Self {
        Self(content)
    }

    /// Returns the rendered content.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the owned content.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Pure rendering contract.
pub trait DocumentRenderer: Send + Sync {
    /// Renders a document.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::TemplateNotFound`] when no template is
    /// registered for the creator and [`RenderError::Render`] when the
    /// template fails to evaluate.
    fn render(&self, request: &RenderRequest) -> Result<RenderedDocument, RenderError>;
}

/// Errors returned by renderers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RenderError {
    /// No template is registered for the organization.
    #[error("no template registered for organization {0}")]
    TemplateNotFound(OrganizationUri),

    /// Template evaluation failed.
    #[error("failed to render template for {creator}: {reason}")]
    Render {
        /// Organization whose template failed.
        creator: OrganizationUri,
        /// Underlying engine message.
        reason: String,
    },
}
