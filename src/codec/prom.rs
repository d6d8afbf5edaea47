//! Prometheus remote-write labels built from the same key/value stream as
//! the text encoder.

use crate::codec::text::{encode_tag, KvSink};
use crate::core::Tag;
use std::fmt::{self, Write};

/// Remote-write `Label`, wire compatible with `prometheus.Label`.
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct Label {
    #[prost(string, tag = "1")]
    pub name: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub value: ::prost::alloc::string::String,
}

impl Label {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Default)]
struct LabelSink {
    labels: Vec<Label>,
}

impl KvSink for LabelSink {
    fn put(&mut self, key: &str, value: fmt::Arguments<'_>) {
        let mut text = String::new();
        let _ = text.write_fmt(value);
        self.labels.push(Label {
            name: key.to_string(),
            value: text,
        });
    }
}

/// One label per encoded key, in encoder order.
pub fn encode_tag_to_prom_labels(tag: &Tag) -> Vec<Label> {
    let mut sink = LabelSink::default();
    encode_tag(tag, &mut sink);
    sink.labels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Code, Field};
    use prost::Message;

    #[test]
    fn test_labels_follow_text_order() {
        let field = Field {
            vtap_id: 3,
            acl_gid: 10,
            tunnel_ip_id: 8,
            ..Default::default()
        };
        let tag = Tag::new(field, Code::TRAFFIC_POLICY);
        let labels = encode_tag_to_prom_labels(&tag);

        assert_eq!(
            labels,
            vec![
                Label::new("acl_gid", "10"),
                Label::new("agent_id", "3"),
                Label::new("team_id", "0"),
                Label::new("tunnel_ip_id", "8"),
            ]
        );

        let text: String = labels
            .iter()
            .map(|l| format!(",{}={}", l.name, l.value))
            .collect();
        assert_eq!(text, tag.to_kv_string());
    }

    #[test]
    fn test_label_wire_format() {
        let label = Label::new("a", "b");
        assert_eq!(label.encode_to_vec(), vec![0x0a, 0x01, b'a', 0x12, 0x01, b'b']);
    }

    #[test]
    fn test_empty_code_has_no_labels() {
        assert!(encode_tag_to_prom_labels(&Tag::default()).is_empty());
    }
}
