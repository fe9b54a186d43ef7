#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!(concat!("../", std::env!("CARGO_PKG_README")))]
pub mod config;
pub mod declaration;
pub mod diagnostic;
pub mod doccomment;
pub mod error;
pub mod files;
pub mod items;
pub mod lint;
pub mod parser;
pub(crate) mod prelude;
pub mod tags;
pub mod textindex;
pub mod validate;
