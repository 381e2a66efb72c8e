//! Program-wide constants.

/// Seed of the singleton engine state PDA.
pub const ENGINE_SEED: &[u8] = b"engine_state";

/// Seed of the custody vault PDA (scoped by engine state).
pub const VAULT_SEED: &[u8] = b"vault";

/// Seed of an active transfers page PDA (scoped by engine state, followed by the page).
pub const ACTIVE_SEED: &[u8] = b"active_transfers";

/// Seed of a transfer record PDA (followed by the id, little endian).
pub const TRANSFER_SEED: &[u8] = b"transfer";

/// Seed of a per-user transfer index header PDA (followed by the user key).
pub const USER_SEED: &[u8] = b"user_transfers";

/// Seed of a per-user id page PDA (followed by the user key and page, little endian).
pub const USER_PAGE_SEED: &[u8] = b"user_transfers_page";

/// A doubling schedule over u64 amounts with unit_step >= 1 never exceeds 64 steps.
pub const MAX_SCHEDULE_STEPS: usize = 64;

/// Ids per user page; a user gets as many pages as needed.
pub const USER_PAGE_CAPACITY: usize = 64;

/// Ids per active index page; freed slots are reused and new pages open on demand.
pub const ACTIVE_PAGE_CAPACITY: usize = 128;

/// Max records processed per `process_pending_releases` call.
pub const MAX_BATCH_RELEASE: usize = 8;

/// Production spacing between tranches (30 days).
pub const PRODUCTION_RELEASE_INTERVAL: i64 = 30 * 86_400;

/// Test-mode spacing between tranches.
pub const TEST_RELEASE_INTERVAL: i64 = 15;

/// Default first tranche, in smallest token units.
pub const DEFAULT_UNIT_STEP: u64 = 1;

/// Default amount below which a transfer is paid out in one step.
pub const DEFAULT_IMMEDIATE_THRESHOLD: u64 = 1_000;

/// First transfer id handed out by a fresh engine.
pub const FIRST_TRANSFER_ID: u64 = 1;
