//! LGD and ELBE backtests against realised losses.

pub mod elbe;
