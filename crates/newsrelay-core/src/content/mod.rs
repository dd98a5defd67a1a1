mod extractor;

pub use extractor::ContentExtractor;
