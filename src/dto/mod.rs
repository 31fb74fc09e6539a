use time::{OffsetDateTime, format_description::well_known::Rfc3339};

pub mod chat;
pub mod field;
pub mod game;
pub mod group;
pub mod health;
pub mod notification;
pub mod user;
pub mod validation;

pub(crate) fn format_timestamp(time: OffsetDateTime) -> String {
    time.format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}

fn format_optional(time: Option<OffsetDateTime>) -> Option<String> {
    time.map(format_timestamp)
}
