mod latch;
pub mod worker;
