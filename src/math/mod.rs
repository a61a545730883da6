pub mod delta;
pub mod muldiv;
pub mod sqrt_ratio;
pub mod swap;
pub mod tick;
pub mod twamm;
pub mod uint;
