pub mod contacts;
pub mod csv_import;
pub mod query;
pub mod row_parser;
pub mod validation;

pub use contacts::ContactService;
pub use query::{QueryPage, QueryPlan};
