pub mod builder;
pub mod liquidity;
pub mod pool;
pub mod swap;
pub mod token;

pub use builder::*;
pub use liquidity::*;
pub use pool::*;
pub use swap::*;
pub use token::*;
