/// Entity primary keys are client-generated UUIDs.
pub type EntityId = uuid::Uuid;

/// Account ids always come from the authenticated session.
pub type AccountId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
