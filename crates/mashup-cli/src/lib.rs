//! Command-line front end for the mashup pipeline

pub mod output;
pub mod request;
pub mod scratch;
