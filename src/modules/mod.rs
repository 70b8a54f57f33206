pub mod config;
pub mod constants;
pub mod fleet;
pub mod map;
pub mod offline;
pub mod position;
pub mod protocol;
pub mod report;
pub mod scorer;
pub mod sim;
pub mod turn;
pub mod unit;
