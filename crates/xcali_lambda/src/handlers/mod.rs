pub mod assets;
pub mod drawings;
pub mod error;
pub mod request;
pub mod routes;
