pub mod context;
pub mod filter;
pub mod history;
pub mod matches;
pub mod message;
pub mod query;

pub use filter::{ComparisonOp, Filter, FilterField};
pub use matches::Match;
pub use message::{Message, Role};
pub use query::ParsedQuery;
