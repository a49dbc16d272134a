pub mod history;
pub mod numeric;
pub mod payload;

pub use history::*;
pub use numeric::*;
pub use payload::*;
