pub mod active_transfers;
pub mod engine_state;
pub mod transfer_record;
pub mod user_transfers;

pub use active_transfers::*;
pub use engine_state::*;
pub use transfer_record::*;
pub use user_transfers::*;
