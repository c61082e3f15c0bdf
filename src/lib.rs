pub mod account;
pub mod adapter;
pub mod address;
pub mod config;
pub mod error;
pub mod gateway;
pub mod hash;
pub mod message;
pub mod signature;
pub mod structs;
pub mod transaction;
pub mod typed_data;
pub mod url;
pub mod wallet;
