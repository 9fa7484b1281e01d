//! Rating migration statistics: transition-matrix stability z-tests,
//! matrix weighted bandwidth, and grade concentration.

pub mod bandwidth;
pub mod concentration;
pub mod stability;
