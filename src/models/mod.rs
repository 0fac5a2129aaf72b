pub mod break_kind;
pub mod employee;
pub mod project_time;
pub mod session;
