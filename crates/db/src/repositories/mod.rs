//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&mut PgConnection` as the first argument, so callers can pass a
//! pooled connection or an open transaction (`&mut *tx`).
//!
//! Owned upserts are guarded: `ON CONFLICT ... DO UPDATE ... WHERE` only
//! touches a row that already belongs to the writing account, and report
//! `false` otherwise.

pub mod account_repo;
pub mod category_repo;
pub mod note_category_repo;
pub mod note_repo;
pub mod note_type_repo;
pub mod reminder_repo;
pub mod schedule_repo;
pub mod tombstone_repo;

pub use account_repo::AccountRepo;
pub use category_repo::CategoryRepo;
pub use note_category_repo::NoteCategoryRepo;
pub use note_repo::NoteRepo;
pub use note_type_repo::NoteTypeRepo;
pub use reminder_repo::ReminderRepo;
pub use schedule_repo::ScheduleRepo;
pub use tombstone_repo::TombstoneRepo;
