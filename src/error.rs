use snafu::Snafu;

#[derive(Snafu, Debug)]
#[snafu(visibility(pub(crate)))]
pub enum ReviewError {
    #[snafu(display("unknown term: {term}"))]
    UnknownTerm { term: String },
    #[snafu(display("quality must be between 0 and 5, got {quality}"))]
    InvalidQuality { quality: u8 },
    #[snafu(display("invalid catalog: {reason}"))]
    InvalidCatalog { reason: String },
    #[snafu(display("storage i/o failed for record {key}"))]
    StorageIo { key: String, source: std::io::Error },
    #[snafu(display("record {key} is not valid json"))]
    Corrupt {
        key: String,
        source: serde_json::Error,
    },
}

pub type Result<T, E = ReviewError> = std::result::Result<T, E>;
