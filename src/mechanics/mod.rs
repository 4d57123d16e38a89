pub mod risk;
pub mod stoch;
pub mod time;

pub use risk::*;
pub use stoch::*;
pub use time::*;
