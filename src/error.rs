use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Serialize)]
pub struct FieldError {
    pub field: String,
    pub title: String,
    pub description: String,
}

#[derive(Error, Debug, Serialize)]
pub enum ChiptabError {
    /// Email field is empty
    #[error("Email is required")]
    MissingEmail,

    /// Email format is invalid
    #[error("Invalid email format: {0}")]
    InvalidEmail(String),

    /// Email is already registered
    #[error("Email {0} already registered")]
    EmailAlreadyRegistered(String),

    /// Login credentials do not match a registered player
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Bearer token missing, malformed, or expired
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Player with given ID not found
    #[error("Player {0} not found")]
    PlayerNotFound(String),

    /// Group with given ID not found
    #[error("Group {0} not found")]
    GroupNotFound(String),

    /// Player is already a member of the group
    #[error("Player {0} is already a group member")]
    AlreadyGroupMember(String),

    /// Player is not a member of the group
    #[error("Player {0} is not a group member")]
    NotGroupMember(String),

    /// Player is not the group owner
    #[error("Player {0} is not group owner")]
    NotGroupOwner(String),

    /// Group has an invalid number of owners (must be exactly 1)
    #[error("Invalid owner count: {0}")]
    InvalidOwnerCount(usize),

    /// Group owner cannot remove themselves
    #[error("Owner cannot remove themselves")]
    OwnerCannotRemoveSelf,

    /// Join link is not valid or not found
    #[error("Join link not found")]
    JoinLinkNotFound,

    /// Partnership with given ID not found
    #[error("Partnership {0} not found")]
    PartnershipNotFound(String),

    /// A partnership must pair two distinct players
    #[error("Cannot create partnership of a player with themselves")]
    SelfPartnership,

    /// Player already belongs to an active partnership in this group
    #[error("Player {0} already has an active partnership")]
    PartnershipOverlap(String),

    /// Session with given ID not found
    #[error("Session {0} not found")]
    SessionNotFound(String),

    /// Session is already closed and no longer accepts changes
    #[error("Session {0} is closed")]
    SessionClosed(String),

    /// Player has no entry in the session
    #[error("Player {0} has not bought in to this session")]
    PlayerNotInSession(String),

    /// Settlement requested while cash-outs are still missing
    #[error("{0} players have not cashed out yet")]
    MissingCashOuts(usize),

    /// Session chips do not sum to zero within the currency epsilon
    #[error("Session {0} does not balance: residual {1}")]
    SessionOutOfBalance(String, f64),

    /// Settlement with given ID not found
    #[error("Settlement {0} not found")]
    SettlementNotFound(String),

    /// Settlement has already been confirmed
    #[error("Settlement {0} already confirmed")]
    SettlementAlreadyConfirmed(String),

    /// Player is not authorized to confirm the settlement
    #[error("Player {0} not authorized to confirm settlement")]
    UnauthorizedSettlementConfirmation(String),

    /// Generic input validation error with detailed field information
    #[error("Invalid input for field `{0}`: {1:?}")]
    InvalidInput(String, FieldError),

    /// Internal server error (e.g., unexpected failure)
    #[error("Internal server error: {0}")]
    InternalServerError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Logging error: {0}")]
    LoggingError(String),

    #[error("Cache error: {0}")]
    CacheError(String),
}
