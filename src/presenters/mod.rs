pub mod console;
pub mod recording;

pub use console::ConsolePresenter;
pub use recording::RecordingPresenter;
