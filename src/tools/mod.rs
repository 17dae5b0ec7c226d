//! Shared machinery for the byte-oriented LZ codecs

pub mod flags;
pub mod search;
pub mod window;

use crate::Warning;

/// record a decoder diagnostic and surface it through the log
pub fn note(list: &mut Vec<Warning>, warning: Warning) {
    log::warn!("{}", warning);
    list.push(warning);
}
