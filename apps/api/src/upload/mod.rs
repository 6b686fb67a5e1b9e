// CV upload: multipart intake, type checks, and text extraction.

pub mod handlers;
pub mod parser;
