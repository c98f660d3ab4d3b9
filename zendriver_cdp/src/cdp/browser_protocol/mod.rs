pub mod browser;
pub mod dom;
pub mod fetch;
pub mod input;
pub mod network;
pub mod page;
pub mod security;
pub mod target;
