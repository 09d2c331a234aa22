//! Centralized constants: audit/log action names and validation limits.
//!
//! The action-name constants are the stable string labels written to audit
//! and log records (`log_and_audit`) and compared against in tests.

// Validation limits
/// Maximum allowed monetary amount for any single recorded value.
pub const MAX_AMOUNT: f64 = 1_000_000.0;
/// Maximum length (in bytes) for user-provided names and labels.
pub const MAX_NAME_LENGTH: usize = 100;
/// Time-to-live for a cached session settlement preview.
pub const SETTLEMENT_CACHE_TTL_SECS: u64 = 300;

// Action names — players and groups
pub const PLAYER_REGISTERED: &str = "player_registered";
pub const GROUP_CREATED: &str = "group_created";
pub const GROUP_DELETED: &str = "group_deleted";
pub const MEMBER_ADDED: &str = "member_added";
pub const MEMBER_JOINED: &str = "member_joined";
pub const MEMBER_REMOVED: &str = "member_removed";
pub const OWNERSHIP_TRANSFERRED: &str = "ownership_transferred";
pub const JOIN_LINK_REGENERATED: &str = "join_link_regenerated";
pub const JOIN_LINK_REVOKED: &str = "join_link_revoked";
pub const STRICT_SETTLEMENT_MODE_TOGGLED: &str = "strict_settlement_mode_toggled";

// Action names — partnerships
pub const PARTNERSHIP_CREATED: &str = "partnership_created";
pub const PARTNERSHIP_DEACTIVATED: &str = "partnership_deactivated";

// Action names — sessions
pub const SESSION_CREATED: &str = "session_created";
pub const SESSION_CLOSED: &str = "session_closed";
pub const BUY_IN_RECORDED: &str = "buy_in_recorded";
pub const CASH_OUT_RECORDED: &str = "cash_out_recorded";

// Action names — settlements
pub const SETTLEMENT_COMPUTED: &str = "settlement_computed";
pub const SETTLEMENT_CONFIRMED: &str = "settlement_confirmed";
pub const PENDING_SETTLEMENTS_QUERIED: &str = "pending_settlements_queried";
