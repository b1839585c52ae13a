//! Diesel schema for publication persistence.

diesel::table! {
    /// Distribution events; an end time closes the event.
    publication_events (id) {
        /// Event URI.
        id -> Text,
        /// Graph the event lives in.
        graph -> Text,
        /// Scheduled start.
        started_at -> Timestamptz,
        /// Recorded end, if any.
        ended_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Publication tasks and their lifecycle status.
    publication_tasks (id) {
        /// Task URI.
        id -> Text,
        /// Graph the task lives in.
        graph -> Text,
        /// Lifecycle status.
        #[max_length = 50]
        status -> Varchar,
        /// Distribution channel URI.
        channel -> Text,
        /// Document URI.
        document -> Text,
        /// Distribution event URI.
        event -> Text,
        /// Rendered document, once rendered.
        rendered_content -> Nullable<Text>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last modification timestamp.
        modified_at -> Timestamptz,
    }
}

diesel::table! {
    /// Documents scheduled for publication.
    publication_documents (id) {
        /// Document URI.
        id -> Text,
        /// Graph the document lives in.
        graph -> Text,
        /// Title; required for publishing.
        title -> Nullable<Text>,
        /// HTML body; required for publishing.
        body -> Nullable<Text>,
        /// Creator organization URI.
        creator -> Nullable<Text>,
        /// Creator display name.
        creator_name -> Nullable<Text>,
        /// Distribution event URI.
        event -> Text,
        /// Cited source contacts.
        sources -> Jsonb,
        /// Attached file URIs.
        attachments -> Jsonb,
    }
}

diesel::table! {
    /// Outbound messages waiting for the mail sender.
    outbox_messages (id) {
        /// Message identifier.
        id -> Uuid,
        /// Minted resource URI.
        uri -> Text,
        /// Sender address.
        sender -> Text,
        /// Primary recipient address.
        recipient -> Text,
        /// Blind-copy recipient addresses.
        bcc -> Jsonb,
        /// Subject line.
        subject -> Text,
        /// HTML body.
        html_body -> Text,
        /// Send timestamp.
        sent_at -> Timestamptz,
        /// Attached file URIs.
        attachments -> Jsonb,
        /// Folder URI.
        folder -> Text,
    }
}
