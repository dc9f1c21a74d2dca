//! Row models for the synchronized tables.
//!
//! Each submodule contains a `FromRow` + `Serialize` struct matching the
//! database row. Every entity model implements
//! [`notesync_core::lww::Versioned`] so conflict rules can be applied to it
//! directly.

pub mod account;
pub mod category;
pub mod note;
pub mod note_category;
pub mod note_type;
pub mod reminder;
pub mod schedule;

pub use account::{Account, CreateAccount};
pub use category::Category;
pub use note::{Note, NoteStatus};
pub use note_category::NoteCategory;
pub use note_type::NoteType;
pub use reminder::{Reminder, ReminderOffsetUnit};
pub use schedule::{RecurrenceType, Schedule};
