// Administrator use cases over the user lifecycle

pub mod commands;
pub mod input;
pub mod lifecycle;
pub mod view;

pub use input::UserInput;
pub use lifecycle::UserLifecycleCoordinator;
pub use view::UserView;
