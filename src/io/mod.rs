pub mod motion_csv;

pub use motion_csv::{load_motion_csv, read_motion_csv};
