//! Role loops: the miner and staker state machines that consume the
//! message router's queues (spec §4.7, §4.8).

pub mod miner_role;
pub mod staker_role;

pub use miner_role::MinerRole;
pub use staker_role::StakerRole;
