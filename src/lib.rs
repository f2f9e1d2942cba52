pub mod alert;
pub mod config;
pub mod feed;
pub mod pose;
pub mod replay;
pub mod scoring;
pub mod session;
