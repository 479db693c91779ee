// Domain value objects
pub mod identifiers;
pub mod transaction_method;

pub use identifiers::*;
pub use transaction_method::*;
