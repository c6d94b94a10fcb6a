pub mod cache;
pub mod config;
pub mod contact;
pub mod episodes;
pub mod live;
pub mod platform;
pub mod protocol;
pub mod state;
pub mod youtube;
