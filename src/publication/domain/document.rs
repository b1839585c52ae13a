//! Documents scheduled for publication and the contacts they cite.

use super::{ChannelUri, DocumentUri, EventUri, OrganizationUri, PublicationDomainError};
use serde::{Deserialize, Serialize};

/// Organization that authored a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creator {
    /// Organization identifier, used to select the render template.
    pub id: OrganizationUri,
    /// Display name, when the organization has one.
    pub name: Option<String>,
}

/// Press release (or similar document) owned by the authoring subsystem.
///
/// The pipeline only reads documents; rendered output is written back onto
/// the publication task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    id: DocumentUri,
    title: String,
    body: String,
    creator: Creator,
    event: EventUri,
}

impl Document {
    /// Creates a validated document.
    ///
    /// # Errors
    ///
    /// Returns [`PublicationDomainError::EmptyTitle`] or
    /// [`PublicationDomainError::EmptyBody`] when a required field is blank.
    pub fn new(
        id: DocumentUri,
        title: impl Into<String>,
        body: impl Into<String>,
        creator: Creator,
        event: EventUri,
    ) -> Result<Self, PublicationDomainError> {
        let title_value = title.into();
        let body_value = body.into();
        if title_value.trim().is_empty() {
            return Err(PublicationDomainError::EmptyTitle);
        }
        if body_value.trim().is_empty() {
            return Err(PublicationDomainError::EmptyBody);
        }
        Ok(Self {
            id,
            title: title_value.trim().to_owned(),
            body: body_value,
            creator,
            event,
        })
    }

    /// Returns the document identifier.
    #[must_use]
    pub const fn id(&self) -> &DocumentUri {
        &self.id
    }

    /// Returns the title, used as message subject.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the HTML body content.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Returns the authoring organization.
    #[must_use]
    pub const fn creator(&self) -> &Creator {
        &self.creator
    }

    /// Returns the distribution event scheduling this document.
    #[must_use]
    pub const fn event(&self) -> &EventUri {
        &self.event
    }
}

/// Kind of reachability a contact point offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactPointKind {
    /// Landline telephone number.
    Telephone,
    /// Mobile phone number.
    Mobile,
    /// Email address.
    Email,
}

/// One way of reaching a contact, valid for a single channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactPoint {
    /// Kind of contact point.
    pub kind: ContactPointKind,
    /// Phone number or address.
    pub value: String,
    /// Channel this point may be published on.
    pub channel: ChannelUri,
}

/// Source person cited in a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    full_name: String,
    role: Option<String>,
    organization: Option<String>,
    contact_points: Vec<ContactPoint>,
}

impl Contact {
    /// Creates a contact with a required name.
    ///
    /// # Errors
    ///
    /// Returns [`PublicationDomainError::EmptyContactName`] when the name is
    /// blank.
    pub fn new(full_name: impl Into<String>) -> Result<Self, PublicationDomainError> {
        let name = full_name.into();
        if name.trim().is_empty() {
            return Err(PublicationDomainError::EmptyContactName);
        }
        Ok(Self {
            full_name: name.trim().to_owned(),
            role: None,
            organization: None,
            contact_points: Vec::new(),
        })
    }

    /// Sets the contact's role.
    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Sets the organization the contact belongs to.
    #[must_use]
    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    /// Adds a contact point.
    #[must_use]
    pub fn with_contact_point(mut self, point: ContactPoint) -> Self {
        self.contact_points.push(point);
        self
    }

    /// Returns the full name.
    #[must_use]
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Returns the role, if any.
    #[must_use]
    pub fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }

    /// Returns the organization, if any.
    #[must_use]
    pub fn organization(&self) -> Option<&str> {
        self.organization.as_deref()
    }

    /// Returns every contact point regardless of channel.
    #[must_use]
    pub fn contact_points(&self) -> &[ContactPoint] {
        &self.contact_points
    }

    /// Projects the contact onto a channel.
    ///
    /// Only contact points tagged with `channel` are kept; per kind the first
    /// matching point wins.
    #[must_use]
    pub fn for_channel(&self, channel: &ChannelUri) -> SourceDetails {
        let first_of = |kind: ContactPointKind| {
            self.contact_points
                .iter()
                .find(|point| point.kind == kind && &point.channel == channel)
                .map(|point| point.value.clone())
        };
        SourceDetails {
            full_name: self.full_name.clone(),
            function: self.role.clone(),
            organization: self.organization.clone(),
            telephone: first_of(ContactPointKind::Telephone),
            mobile: first_of(ContactPointKind::Mobile),
            email: first_of(ContactPointKind::Email),
        }
    }
}

/// Channel-filtered view of a contact, as handed to templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDetails {
    /// Full name.
    pub full_name: String,
    /// Role of the person.
    pub function: Option<String>,
    /// Organization the person speaks for.
    pub organization: Option<String>,
    /// Telephone number usable on the channel.
    pub telephone: Option<String>,
    /// Mobile number usable on the channel.
    pub mobile: Option<String>,
    /// Email address usable on the channel.
    pub email: Option<String>,
}
