//! Service layer separating file I/O from compositing logic

pub mod io;

pub use io::{ImagePair, ImagePairLoader, PairRole};
