// file: src/parser/mod.rs
// description: tab-separated source parsing module exports
// reference: internal module structure

pub mod reader;
pub mod row;

pub use reader::RecordReader;
pub use row::RawRow;
