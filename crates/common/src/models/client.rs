use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Account owner a device belongs to. Approvals and devices are scoped to a
/// client; nothing crosses this boundary.
#[derive(Debug, Clone)]
pub struct Client {
    pub client_id: Uuid,
    pub created_at: DateTime<Utc>,
}
