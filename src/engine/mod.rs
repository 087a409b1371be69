//! Movement resolution: discrete tick policies and the continuous engine

pub mod discrete;
pub mod fmm;
pub mod marching;
