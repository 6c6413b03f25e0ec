pub mod config;
pub mod logging;

pub mod cleanup;
pub mod dataset;
pub mod discovery;
pub mod extract;
pub mod fetch;
pub mod locate;
pub mod pipeline;
pub mod retry;
pub mod table;
pub mod url_model;
pub mod workspace;
