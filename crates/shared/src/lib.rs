//! Invevent Shared - process bootstrap used by the binaries and their tests

pub mod bootstrap;
