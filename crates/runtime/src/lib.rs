pub mod clock;
pub mod diagnostics;
pub mod store;

pub use clock::*;
pub use diagnostics::*;
pub use store::*;
