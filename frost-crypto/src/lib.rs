pub mod dispatch;
pub mod dkg;
pub mod identifier;
pub mod identity;
pub mod jointkey;
pub mod signing;
pub mod tweak;

pub use dispatch::*;
pub use jointkey::TempKeyPair;
