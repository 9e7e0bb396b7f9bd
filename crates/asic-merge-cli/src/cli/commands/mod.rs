mod dispatch;
pub mod inspect;
pub mod merge;

pub use dispatch::dispatch;
