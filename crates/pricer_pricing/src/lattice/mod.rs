//! Binomial lattice pricing with early exercise, barrier truncation and
//! call/put schedules.

mod binomial;

pub use binomial::{
    step_for_time, BinomialTree, LatticeParams, LatticeResult, LatticeSpec, NodeBarrier,
    NodePayoff,
};
