/// Suffix appended to a tenant table name to form its id sequence name
pub const SEQUENCE_SUFFIX: &str = "_id_seq";

/// Tables plus sequences making up one complete tenant table set
pub const TENANT_OBJECT_COUNT: i64 = 10;

/// Longest display name accepted for a new map
pub const MAX_MAP_NAME_LEN: usize = 255;

/// Maximum length for a map tag key
pub const MAX_TAG_KEY_LEN: usize = 255;

/// Longest e-mail address accepted for a new user
pub const MAX_EMAIL_LEN: usize = 254;

// =============================================================================
// Requester identity (set by the authenticating gateway)
// =============================================================================

/// Header carrying the authenticated user id
pub const USER_ID_HEADER: &str = "x-user-id";

/// Header carrying hex HMAC-SHA256 of the user id
pub const USER_SIGNATURE_HEADER: &str = "x-user-signature";

// =============================================================================
// Error Messages
// =============================================================================

/// Error message for a blank id-or-name reference
pub const ERR_BLANK_REFERENCE: &str = "A record ID or name must be specified";

/// Error message for a malformed requester id header
pub const ERR_INVALID_REQUESTER: &str = "Invalid user ID header";

/// Error message for a malformed e-mail address
pub const ERR_INVALID_EMAIL: &str = "A valid e-mail address must be specified";

/// Error message returned for any denied job or map access
pub const ERR_FORBIDDEN: &str = "Access to this resource is forbidden";
