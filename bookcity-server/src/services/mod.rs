//! Services - router assembly

pub mod http;
