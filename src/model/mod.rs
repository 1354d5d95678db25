pub mod customer;
pub mod employee;
pub mod order;
pub mod product;
pub mod supplier;

pub use customer::*;
pub use employee::*;
pub use order::*;
pub use product::*;
pub use supplier::*;

/// Primary keys are `serial` columns.
pub type Id = i32;
