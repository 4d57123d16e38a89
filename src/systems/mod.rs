pub mod sdk;
pub mod scenario;
pub mod env;

pub use env::*;
pub use scenario::*;
pub use sdk::*;
