pub use alloy_primitives::{Address, B256, U256};

pub mod math;
pub mod quoting;
pub mod state;

mod private {
    pub trait Sealed {}
}
