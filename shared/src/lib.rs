//! Wire envelopes shared by the user service and the upstream work services.

pub mod protocol;

pub use protocol::{ExceptionWrapper, ResponseWrapper, ValidationExceptionWrapper};
