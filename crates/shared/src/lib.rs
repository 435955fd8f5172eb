//! Domain, wire and error types shared by the upload controller and its hosts.

pub mod domain;
pub mod error;
pub mod protocol;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
