//! Tag encodings: line-protocol text, Prometheus labels and the sentinel
//! id helpers they share.

pub mod prom;
pub mod special_id;
pub mod text;

pub use prom::{encode_tag_to_prom_labels, Label};
pub use special_id::{
    marshal_i32_with_special_id, marshal_u16s, unmarshal_i32_with_special_id, unmarshal_u16s,
    SpecialId, ID_INTERNET, ID_OTHER,
};
pub use text::{encode_key, encode_tag, KvSink, SliceSink, MAX_APP_FIELD_LEN, MAX_STRING_LENGTH};
