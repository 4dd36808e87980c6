//! Document state and logic (store-agnostic).

mod io;
mod ops;
mod state;

pub use ops::CellWrite;
pub use state::Document;
