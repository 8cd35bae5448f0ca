pub mod error;
pub mod goal;
pub mod state;

pub use error::{Result, TrellisError};
pub use goal::Goal;
pub use state::RunState;
