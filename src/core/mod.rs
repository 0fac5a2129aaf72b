pub mod calculator;
pub mod clock;
pub mod gateway;
pub mod log;
pub mod monitor;
pub mod poll;
pub mod state;
pub mod timer;
pub mod tracker;
