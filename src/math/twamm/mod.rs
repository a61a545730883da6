pub mod exp2;
pub mod sqrt_ratio;
