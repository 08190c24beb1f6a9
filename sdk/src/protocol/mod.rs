pub mod fees;
pub mod liquidity;
pub mod math;
pub mod pda;

pub use fees::*;
pub use liquidity::*;
pub use math::*;
pub use pda::*;
