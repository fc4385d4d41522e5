#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub use relic_codec as codec;
pub use relic_reflect as reflect;
