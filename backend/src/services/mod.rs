//! Business logic services for the Property Back Office

pub mod generator;
pub mod inventory;
pub mod month_end;
pub mod property;
pub mod reconciler;
pub mod stock;

pub use generator::GeneratorService;
pub use inventory::InventoryService;
pub use month_end::MonthEndService;
pub use property::PropertyService;
pub use reconciler::SheetReconciler;
pub use stock::StockService;
