use crate::core::code::Code;
use crate::core::error::{FlowTagError, Result};
use crate::core::field::{format_mac, Field};
use crate::schema::MetricsTableId;
use std::fmt;
use std::ops::{Deref, DerefMut};

const SUFFIX_ACL: usize = 1;
const SUFFIX_EDGE: usize = 2;
const SUFFIX_PORT: usize = 4;

/// Database name suffix indexed by [`Tag::database_suffix_id`].
pub const DATABASE_SUFFIX: [&str; 8] = [
    "",               // 000
    "_acl",           // 001
    "_edge",          // 010
    "_acl_edge",      // 011
    "_port",          // 100
    "_acl_port",      // 101
    "_edge_port",     // 110
    "_acl_edge_port", // 111
];

/// A [`Field`] together with the [`Code`] that says which of its attributes
/// are meaningful.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Tag {
    pub field: Field,
    pub code: Code,
    id: Option<String>,
}

impl Tag {
    pub fn new(field: Field, code: Code) -> Self {
        Self {
            field,
            code,
            id: None,
        }
    }

    /// Routes the tag to its metrics table.
    ///
    /// MAC bits are ignored; any other bit outside the table codes makes the
    /// tag unroutable. Traffic-policy tags have no second-resolution table.
    pub fn table_id(&self, is_second: bool) -> Result<MetricsTableId> {
        let code = self.code.without_mac();
        let minute = MetricsTableId::MINUTE
            .iter()
            .copied()
            .find(|id| id.table_code() == code)
            .ok_or(FlowTagError::TableNotMatched {
                code: self.code,
                is_second,
            })?;

        if !is_second {
            return Ok(minute);
        }
        minute.second().ok_or(FlowTagError::NoSecondTable(minute))
    }

    pub fn database_suffix_id(&self) -> usize {
        let mut id = 0;
        if self.code.has(Code::ACL_GID) {
            id |= SUFFIX_ACL;
        }
        if self.code.has_edge_tag_field() {
            id |= SUFFIX_EDGE;
        }
        if self.code.has(Code::SERVER_PORT) {
            id |= SUFFIX_PORT;
        }
        id
    }

    pub fn database_suffix(&self) -> &'static str {
        DATABASE_SUFFIX[self.database_suffix_id()]
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    pub fn code(&self) -> Code {
        self.code
    }

    pub fn set_code(&mut self, code: impl Into<Code>) {
        self.code = code.into();
    }

    pub fn set_tid(&mut self, tid: u8) {
        self.field.global_thread_id = tid;
    }

    pub fn tap_type(&self) -> u8 {
        self.field.tap_type
    }
}

impl Deref for Tag {
    type Target = Field;

    fn deref(&self) -> &Field {
        &self.field
    }
}

impl DerefMut for Tag {
    fn deref_mut(&mut self) -> &mut Field {
        &mut self.field
    }
}

/// `fields:<kv fragment>[,mac=..][,mac_0=..,mac_1=..] code:x<16 hex digits>`
impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("fields:")?;
        f.write_str(&self.to_kv_string())?;
        if self.code.has(Code::MAC) {
            write!(f, ",mac={}", format_mac(self.field.mac))?;
        }
        if self.code.has(Code::MAC_PATH) {
            write!(
                f,
                ",mac_0={},mac_1={}",
                format_mac(self.field.mac),
                format_mac(self.field.mac1)
            )?;
        }
        write!(f, " code:x{:016x}", self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag_with(code: Code) -> Tag {
        Tag::new(Field::default(), code)
    }

    #[test]
    fn test_table_id_minute_and_second() {
        let tag = tag_with(Code::NETWORK);
        assert_eq!(tag.table_id(false).unwrap(), MetricsTableId::Network1m);
        assert_eq!(tag.table_id(true).unwrap(), MetricsTableId::Network1s);

        let tag = tag_with(Code::APPLICATION_MAP);
        assert_eq!(tag.table_id(true).unwrap(), MetricsTableId::ApplicationMap1s);
    }

    #[test]
    fn test_table_id_ignores_mac_bits() {
        let tag = tag_with(Code::NETWORK_MAP | Code::MAC | Code::MAC_PATH);
        assert_eq!(tag.table_id(false).unwrap(), MetricsTableId::NetworkMap1m);
    }

    #[test]
    fn test_table_id_unmatched() {
        let tag = tag_with(Code::NETWORK | Code::ACL_GID);
        let err = tag.table_id(false).unwrap_err();
        assert!(matches!(err, FlowTagError::TableNotMatched { is_second: false, .. }));

        assert!(tag_with(Code::NONE).table_id(true).is_err());
    }

    #[test]
    fn test_traffic_policy_has_no_second_table() {
        let tag = tag_with(Code::TRAFFIC_POLICY);
        assert_eq!(tag.table_id(false).unwrap(), MetricsTableId::TrafficPolicy1m);
        assert!(matches!(
            tag.table_id(true),
            Err(FlowTagError::NoSecondTable(MetricsTableId::TrafficPolicy1m))
        ));
    }

    #[test]
    fn test_database_suffix() {
        assert_eq!(tag_with(Code::NETWORK).database_suffix(), "_port");
        assert_eq!(tag_with(Code::NETWORK_MAP).database_suffix(), "_edge_port");
        assert_eq!(tag_with(Code::TRAFFIC_POLICY).database_suffix(), "_acl");
        assert_eq!(tag_with(Code::IP).database_suffix(), "");
        let all = tag_with(Code::ACL_GID | Code::IP_PATH | Code::SERVER_PORT);
        assert_eq!(all.database_suffix_id(), 7);
        assert_eq!(all.database_suffix(), "_acl_edge_port");
    }

    #[test]
    fn test_accessors() {
        let mut tag = Tag::default();
        assert_eq!(tag.id(), None);
        tag.set_id("flow-1");
        tag.set_code(Code::NETWORK.bits());
        tag.set_tid(3);
        tag.tap_type = 3;

        assert_eq!(tag.id(), Some("flow-1"));
        assert_eq!(tag.code(), Code::NETWORK);
        assert_eq!(tag.global_thread_id, 3);
        assert_eq!(tag.tap_type(), 3);
    }

    #[test]
    fn test_display() {
        let mut tag = tag_with(Code::SERVER_PORT | Code::MAC);
        tag.server_port = 53;
        tag.mac = 0x0011_2233_4455;
        assert_eq!(
            tag.to_string(),
            "fields:,server_port=53,mac=00:11:22:33:44:55 code:x0000080000000800"
        );
    }
}
