#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

pub use gr_cfg as cfg;
pub use gr_serial as serial;
pub use gr_utils as utils;
