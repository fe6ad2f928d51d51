pub mod progress;
pub mod tree;
pub mod visitor;

pub use progress::TaskProgress;
pub use tree::*;
pub use visitor::*;
