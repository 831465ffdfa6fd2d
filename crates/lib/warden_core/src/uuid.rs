// Helper for generating UUIDv7 (timestamp-sortable UUIDs)
//
// Every record id in Warden (users, trusted apps, clients, access tokens)
// is generated app-side so both store backends agree on the format.

use uuid::Uuid;

/// Generate a new UUIDv7 (timestamp-sortable).
pub fn uuidv7() -> Uuid {
    Uuid::now_v7()
}

/// Parse a client-supplied identifier, `None` if it is not a well-formed UUID.
pub fn parse_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw.trim()).ok()
}
