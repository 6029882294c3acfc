//! Command implementations for teamcfg-cli

pub mod check_name;
pub mod overlay;
pub mod profiles;
pub mod show;

pub use check_name::run_check_name;
pub use overlay::run_overlay;
pub use profiles::run_profiles;
pub use show::{run_merged, run_show};
