//! Services separating I/O and progress reporting from pipeline logic

pub mod io;
pub mod progress;

pub use io::ImageIOService;
pub use progress::{
    ConsoleProgressReporter, NoOpProgressReporter, ProcessingStage, ProgressReporter,
    RemovalProgress,
};
