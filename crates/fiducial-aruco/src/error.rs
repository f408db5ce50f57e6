/// Dictionary construction and lookup failures.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DictionaryError {
    #[error("dictionary \"{name}\" not recognized")]
    UnknownDictionary { name: String },
    #[error("id {id} not valid for dictionary \"{dictionary}\", expected 0..{count}")]
    InvalidMarkerId {
        id: usize,
        dictionary: String,
        count: usize,
    },
    #[error("code #{index} is invalid: {reason}")]
    InvalidCode { index: usize, reason: String },
    #[error("{0} bits is not a square number of at most 64")]
    UnsupportedBitCount(usize),
    #[error("dictionary has no codes")]
    Empty,
}
