//! Tour guide marketing site: page server, edge rewrites and site API,
//! plus the operations used to publish and maintain it.

pub mod api;
pub mod backend;
pub mod config;
pub mod content;
pub mod db;
pub mod edge;
pub mod handler;
pub mod http;
pub mod logger;
pub mod models;
pub mod ops;
pub mod pages;
pub mod server;

#[cfg(test)]
mod testing;
