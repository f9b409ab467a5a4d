//! Domain models for the Property Back Office

mod inventory;
mod month_end;
mod product;
mod property;

pub use inventory::*;
pub use month_end::*;
pub use product::*;
pub use property::*;
