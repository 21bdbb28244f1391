pub mod csv;

pub use self::csv::{preview, CsvOptions, Preview, RowStream, StreamItem};
