//! End-to-end tests of the farming engine against an in-memory chain.

mod farming;
mod mock_chain;
