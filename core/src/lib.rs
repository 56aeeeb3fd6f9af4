pub mod corpus;
pub mod index;
pub mod stopwords;
pub mod tokenizer;

pub use corpus::{Document, SnapshotMeta};
pub use index::{TermId, TermMatrix};
