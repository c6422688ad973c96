pub mod constants;
pub mod enums;
pub mod filters;
pub mod medicine;

pub use enums::*;
pub use filters::MedicineFilter;
pub use medicine::*;
