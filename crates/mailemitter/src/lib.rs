pub mod alphabet;
mod builder;
mod encoded_word;
mod encoder;
mod error;
mod folder;
mod headermap;
mod headervalue;
mod mimepart;
mod normalize;
mod options;
mod sink;
mod stats;

pub use error::MailEmitError;
pub type Result<T> = std::result::Result<T, MailEmitError>;

pub use builder::*;
pub use encoded_word::{EncodedWord, WordScheme};
pub use encoder::*;
pub use folder::*;
pub use headermap::*;
pub use headervalue::*;
pub use mimepart::*;
pub use normalize::normalize_line_endings;
pub use options::FoldOptions;
pub use sink::{EmitSink, WriteSink};
pub use stats::*;
