pub mod batch;
pub mod features;
pub mod outcome;
pub mod readings;

pub use batch::*;
pub use features::*;
pub use outcome::*;
pub use readings::*;
