//! Embedded built-in dictionaries.
//!
//! The source-of-truth lives in `fiducial-aruco/data/*_CODES.json`; `build.rs`
//! turns each file into a `<NAME>_CODES` table and an entry of [`BUILTINS`].

#![allow(clippy::unreadable_literal, non_upper_case_globals)]

use crate::Dictionary;

/// Static description of an embedded dictionary.
#[derive(Clone, Copy, Debug)]
pub struct BuiltinDictionary {
    pub name: &'static str,
    pub n_bits: u32,
    /// Match tolerance; `None` derives it from the codes.
    pub tau: Option<u32>,
    /// Row-major, most significant bit first, white = 1.
    pub codes: &'static [u64],
}

include!(concat!(env!("OUT_DIR"), "/builtins.rs"));

/// Names of every embedded dictionary.
pub fn names() -> impl Iterator<Item = &'static str> {
    BUILTINS.iter().map(|b| b.name)
}

/// Look up an embedded dictionary by exact name.
pub fn builtin(name: &str) -> Option<&'static BuiltinDictionary> {
    BUILTINS.iter().find(|b| b.name == name)
}

/// Build the embedded dictionary `name`, if there is one.
pub fn builtin_dictionary(name: &str) -> Option<Dictionary> {
    let b = builtin(name)?;
    Dictionary::from_static(b.name, b.n_bits as usize, b.codes, b.tau).ok()
}
