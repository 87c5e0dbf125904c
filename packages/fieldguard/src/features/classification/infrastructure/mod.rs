//! Classification infrastructure

pub mod allow_list;
pub mod classify;
pub mod report;

pub use allow_list::read_allow_list;
pub use classify::classify;
pub use report::{render_detailed, render_legacy};
