//! Model representation: targets, terms, and term tensors.
//!
//! - [`Target`]: regression or classification, and the per-cell score width
//! - [`Term`]: ordered feature dimensions jointly modeled by one tensor
//! - [`Tensor`]: compressed or expanded values over a term

mod target;
mod tensor;
mod term;

pub use target::Target;
pub use tensor::Tensor;
pub use term::{Feature, Term};
