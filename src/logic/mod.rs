pub mod mapper;
pub mod paginate;
pub mod person_service;
pub mod reconcile;

pub use mapper::*;
pub use paginate::*;
pub use person_service::*;
pub use reconcile::*;
