pub const LOCKED_MIN_REPLY: usize = 8;
pub const LOCKED_QUERY_OVERLAP: u64 = 4;
pub const LOCKED_QUERY_SIZE: u64 = 192;
pub const HUNT_QUERY_SIZE: u64 = 16;
pub const HUNT_FORWARD_EXPAND_SHIFT: u32 = 4;
pub const HUNT_BACKWARD_EXPAND_SHIFT: u32 = 1;
