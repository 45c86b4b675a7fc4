pub mod source;

pub use source::SourcePlugin;
