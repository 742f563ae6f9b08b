pub mod scenario;
pub mod util;

pub use util::{run_key, split_csv};
