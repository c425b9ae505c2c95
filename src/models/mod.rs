pub mod generation;
pub mod remote;
pub mod task;
pub mod tool;

pub use generation::*;
pub use remote::*;
pub use task::*;
pub use tool::*;
