//! tableaccess - request-driven data access over a single-table key-value store
//!
//! - `codec`: native records to and from the store's tagged wire form
//! - `expression`: record patches and dynamic SET instructions
//! - `store`: the store protocol and an in-memory implementation
//! - `table`: the table accessor (fetch one/many, insert, update, delete)
//! - `middleware`: the before/after/on_error request pipeline
//! - `handlers`: record handlers wired into the pipeline
//! - `upload`: signed upload URLs

pub mod cli;
pub mod codec;
pub mod config;
pub mod expression;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod store;
pub mod table;
pub mod upload;
