pub mod reader;
pub mod writer;

pub use reader::{read_forcing_input, ForcingInput};
pub use writer::ForcingFileWriter;
