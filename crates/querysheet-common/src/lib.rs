pub mod error;
pub mod range;
pub mod value;

pub use error::*;
pub use range::*;
pub use value::*;
