//! # Network Model
//!
//! 網路流量線性規劃：模型建構、求解後端介面、結果提取

pub mod backend;
pub mod builder;
pub mod lp;

pub use backend::{default_backend, LpBackend, MinilpBackend, SolverOutcome, WithDeadline};
pub use builder::{optimize_network, NetworkModel};
pub use lp::{Column, ColumnId, LinearProgram, Row, RowSense};
