pub mod model;
pub mod repository;

pub use model::Bill;
pub use repository::BillRepository;
