mod model;
mod repository;

pub use model::{CandleRowDB, CandleSetDB};
pub use repository::CandleRepository;
