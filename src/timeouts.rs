pub mod ms {
    pub const POLL_INTERVAL: u64 = 100;
    pub const ELEMENT_TIMEOUT: u64 = 10_000;
    pub const READY_STATE_SETTLE: u64 = 50;
    pub const PAGE_SETTLE: u64 = 300;
    pub const PROGRESS_POLL: u64 = 500;
}

pub mod secs {
    pub const READY_STATE: u64 = 5;
    pub const NAVIGATION: u64 = 30;
    pub const CDP_REQUEST: u64 = 120;
}
