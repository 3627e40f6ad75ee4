pub mod evaluate;
pub mod metric;

pub use evaluate::evaluate;
pub use metric::Metric;
