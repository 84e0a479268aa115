#![allow(
    dead_code,
    unused_imports,
    unused_variables,
    clippy::too_many_arguments,
    clippy::len_zero
)]

pub mod app;
pub mod services;
pub mod theme;
pub mod ui;
