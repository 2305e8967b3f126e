//! A scheduling backend for a community activity calendar: a public
//! calendar of activities plus an admin API for managing them, their
//! reference lists, and visitor-submitted schedule requests.

pub mod config;
pub mod error;
pub mod graphql;
pub mod models;
pub mod store;
pub mod util;

#[cfg(test)]
mod tests;
