//! Graph input and result output

pub mod matrix_market;
pub mod output;

pub use matrix_market::{load_matrix_market, read_matrix_market};
pub use output::{write_output, write_output_to, UNREACHED_SENTINEL};
