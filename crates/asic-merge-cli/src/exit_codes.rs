//! Process exit codes. Part of the CLI contract.

pub const SUCCESS: i32 = 0;
pub const MERGE_FAILED: i32 = 1; // Terminal failure during the merge run
pub const CONFIG_ERROR: i32 = 2; // Bad flags, env or config file
