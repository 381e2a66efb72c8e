pub mod initialize_engine;
pub mod set_keeper;
pub mod pause;
pub mod unpause;
pub mod create_staggered_transfer;
pub mod can_execute_release;
pub mod execute_staggered_release;
pub mod process_pending_releases;
pub mod get_transfer_info;
pub mod get_user_transfers;
pub mod get_stats;
pub mod emergency_release;
pub mod emergency_close;
pub mod emergency_return;

pub use initialize_engine::*;
pub use set_keeper::*;
pub use pause::*;
pub use unpause::*;
pub use create_staggered_transfer::*;
pub use can_execute_release::*;
pub use execute_staggered_release::*;
pub use process_pending_releases::*;
pub use get_transfer_info::*;
pub use get_user_transfers::*;
pub use get_stats::*;
pub use emergency_release::*;
pub use emergency_close::*;
pub use emergency_return::*;
