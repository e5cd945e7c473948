// Domain layer - business logic, entities, value objects
// No dependencies on other layers

pub mod entities;
pub mod value_objects;
pub mod work_items;

pub use entities::*;
pub use value_objects::*;
pub use work_items::*;
