use anchor_lang::prelude::*;

/// Result of the pure state and schedule helpers.
pub type StaggeredResult<T> = core::result::Result<T, StaggeredError>;

/// Custom error codes for the staggered release program.
#[error_code]
pub enum StaggeredError {
    #[msg("Transfer not found")]
    NotFound,

    #[msg("Release not eligible yet: time gate has not passed")]
    NotEligibleYet,

    #[msg("Transfer already completed")]
    AlreadyCompleted,

    #[msg("Unauthorized: owner signature required")]
    UnauthorizedOwner,

    #[msg("Unauthorized: only the recipient or the keeper may release")]
    UnauthorizedCaller,

    #[msg("Unauthorized: keeper signature required")]
    UnauthorizedKeeper,

    #[msg("Insufficient custody balance")]
    InsufficientCustodyBalance,

    #[msg("Invalid amount (must be > 0)")]
    InvalidAmount,

    #[msg("Invalid configuration")]
    InvalidConfig,

    #[msg("Invalid public key")]
    InvalidPubkey,

    #[msg("Invalid token mint")]
    InvalidTokenMint,

    #[msg("Invalid token account")]
    InvalidTokenAccount,

    #[msg("Invalid associated token account for recipient")]
    InvalidRecipientAta,

    #[msg("Engine is paused")]
    EnginePaused,

    #[msg("Engine is not paused")]
    EngineNotPaused,

    #[msg("User transfer page does not match the user's current page")]
    InvalidUserPage,

    #[msg("Active transfer page is full")]
    ActiveIndexFull,

    #[msg("Active transfer page does not exist or does not hold this transfer")]
    InvalidActivePage,

    #[msg("Schedule exceeds the maximum step count")]
    ScheduleTooLong,

    #[msg("Empty batch")]
    EmptyBatch,

    #[msg("Sweep accounts must come in (record, recipient token account) pairs")]
    SweepAccountsMismatch,

    #[msg("Math overflow")]
    MathOverflow,
}
