pub mod literal_replace;
pub mod sql_quoting;

pub use literal_replace::LiteralReplacer;
pub use sql_quoting::{is_sql_identifier, quote_string_literal};
