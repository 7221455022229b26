pub mod category;
pub mod compare;
pub mod config;
pub mod dashboard;
pub mod decode;
pub mod derived;
pub mod error;
pub mod export;
pub mod fetch;
pub mod http_client;
pub mod league;
pub mod logging;
pub mod normalize;
pub mod page;
pub mod persist;
pub mod session;
