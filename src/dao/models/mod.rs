//! Persisted aggregates shared by every storage backend.

mod field;
mod game;
mod group;
mod message;
mod notification;
mod user;

pub use field::*;
pub use game::*;
pub use group::*;
pub use message::*;
pub use notification::*;
pub use user::*;

use time::Date;

// Calendar dates are stored as `YYYY-MM-DD`.
time::serde::format_description!(calendar_date, Date, "[year]-[month]-[day]");
