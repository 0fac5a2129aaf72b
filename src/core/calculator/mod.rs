pub mod elapsed;
pub mod expected;
