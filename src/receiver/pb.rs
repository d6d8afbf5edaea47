//! Inbound wire messages for document tags.

/// Compact tag as sent by agents: the raw field values plus the code that
/// says which of them are meaningful.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MiniTag {
    #[prost(message, optional, tag = "1")]
    pub field: ::core::option::Option<MiniField>,
    #[prost(uint64, tag = "2")]
    pub code: u64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MiniField {
    /// 4 bytes for IPv4, 16 for IPv6
    #[prost(bytes = "vec", tag = "1")]
    pub ip: ::prost::alloc::vec::Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub ip1: ::prost::alloc::vec::Vec<u8>,
    #[prost(uint32, tag = "3")]
    pub global_thread_id: u32,
    #[prost(uint32, tag = "4")]
    pub is_ipv6: u32,
    #[prost(int32, tag = "5")]
    pub l3_epc_id: i32,
    #[prost(int32, tag = "6")]
    pub l3_epc_id1: i32,
    #[prost(uint64, tag = "7")]
    pub mac: u64,
    #[prost(uint64, tag = "8")]
    pub mac1: u64,
    #[prost(uint32, tag = "9")]
    pub direction: u32,
    #[prost(uint32, tag = "10")]
    pub tap_side: u32,
    #[prost(uint32, tag = "11")]
    pub protocol: u32,
    #[prost(uint32, tag = "12")]
    pub acl_gid: u32,
    /// Also carries the tunnel distribution point id for policy tags
    #[prost(uint32, tag = "13")]
    pub server_port: u32,
    #[prost(uint32, tag = "14")]
    pub vtap_id: u32,
    #[prost(uint64, tag = "15")]
    pub tap_port: u64,
    #[prost(uint32, tag = "16")]
    pub tap_type: u32,
    #[prost(uint32, tag = "17")]
    pub l7_protocol: u32,
    #[prost(string, tag = "18")]
    pub app_service: ::prost::alloc::string::String,
    #[prost(string, tag = "19")]
    pub app_instance: ::prost::alloc::string::String,
    #[prost(string, tag = "20")]
    pub endpoint: ::prost::alloc::string::String,
    #[prost(uint32, tag = "21")]
    pub biz_type: u32,
    #[prost(uint32, tag = "22")]
    pub gpid: u32,
    #[prost(uint32, tag = "23")]
    pub gpid1: u32,
    #[prost(uint32, tag = "24")]
    pub pod_id: u32,
    #[prost(uint32, tag = "25")]
    pub signal_source: u32,
}
