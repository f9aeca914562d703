pub mod asset_store;
pub mod drawing_store;
pub mod s3;
