pub mod page;
pub mod person;

pub use page::*;
pub use person::*;
