//! Storage usage on z/OS: buffer pools and page sets
//!
//! One usage request returns rows of several kinds; each row names its kind
//! in a usage-type field and is identified by an integer id.

use super::{ParseContext, Row, StatusAttribute, StatusValue};
use crate::protocol::constants::*;
use crate::protocol::PcfParameter;

pub const ATTR_BP_ID: &str = "id";
pub const ATTR_BP_LOCATION: &str = "location";
pub const ATTR_BP_CLASS: &str = "pageclass";
pub const ATTR_BP_TOTAL: &str = "buffers_total";
pub const ATTR_BP_FREE: &str = "buffers_free";
pub const ATTR_BP_FREE_PERCENT: &str = "buffers_free_percent";

pub const ATTR_PS_ID: &str = "id";
pub const ATTR_PS_BPID: &str = "bufferpool";
pub const ATTR_PS_TOTAL: &str = "pages_total";
pub const ATTR_PS_UNUSED: &str = "pages_unused";
pub const ATTR_PS_PERSIST: &str = "pages_persistent";
pub const ATTR_PS_NONPERSIST: &str = "pages_nonpersistent";
pub const ATTR_PS_EXPAND_COUNT: &str = "expansion_count";
pub const ATTR_PS_STATUS: &str = "status";

pub fn buffer_pool_attributes() -> Vec<(&'static str, StatusAttribute)> {
    vec![
        (ATTR_BP_ID, StatusAttribute::pseudo("id", "Buffer Pool ID")),
        (
            ATTR_BP_LOCATION,
            StatusAttribute::new("location", "Buffer Pool Location", MQIACF_BUFFER_POOL_LOCATION),
        ),
        (
            ATTR_BP_CLASS,
            StatusAttribute::new("pageclass", "Buffer Pool Page Class", MQIACF_PAGECLAS),
        ),
        (
            ATTR_BP_TOTAL,
            StatusAttribute::new("buffers_total", "Buffers Total", MQIACF_USAGE_TOTAL_BUFFERS),
        ),
        (
            ATTR_BP_FREE,
            StatusAttribute::new("buffers_free", "Buffers Free", MQIACF_USAGE_FREE_BUFF),
        ),
        (
            ATTR_BP_FREE_PERCENT,
            StatusAttribute::pseudo("buffers_free_percent", "Buffers Free Percent"),
        ),
    ]
}

pub fn page_set_attributes() -> Vec<(&'static str, StatusAttribute)> {
    vec![
        (ATTR_PS_ID, StatusAttribute::pseudo("id", "Page Set ID")),
        (
            ATTR_PS_BPID,
            StatusAttribute::new("bufferpool", "Buffer Pool", MQIACF_BUFFER_POOL_ID),
        ),
        (
            ATTR_PS_TOTAL,
            StatusAttribute::new("pages_total", "Total Pages", MQIACF_USAGE_TOTAL_PAGES),
        ),
        (
            ATTR_PS_UNUSED,
            StatusAttribute::new("pages_unused", "Unused Pages", MQIACF_USAGE_UNUSED_PAGES),
        ),
        (
            ATTR_PS_PERSIST,
            StatusAttribute::new("pages_persistent", "Persistent Data Pages", MQIACF_USAGE_PERSIST_PAGES),
        ),
        (
            ATTR_PS_NONPERSIST,
            StatusAttribute::new("pages_nonpersistent", "Non-persistent Data Pages", MQIACF_USAGE_NONPERSIST_PAGES),
        ),
        (
            ATTR_PS_EXPAND_COUNT,
            StatusAttribute::new("expansion_count", "Expansion Count", MQIACF_USAGE_EXPAND_COUNT).delta(),
        ),
        (
            ATTR_PS_STATUS,
            StatusAttribute::new("status", "Page Set Status", MQIACF_PAGESET_STATUS),
        ),
    ]
}

fn find_int(params: &[PcfParameter], code: i32) -> Option<i64> {
    params
        .iter()
        .find(|p| p.code == code && p.is_integer_family())
        .and_then(PcfParameter::as_int)
}

fn is_kind(params: &[PcfParameter], kind: i32) -> bool {
    match find_int(params, MQIACF_USAGE_TYPE) {
        Some(t) => t == kind as i64,
        None => true,
    }
}

pub fn identify_buffer_pool(params: &[PcfParameter], _ctx: &ParseContext) -> Option<Row> {
    if !is_kind(params, MQIACF_USAGE_BUFFER_POOL) {
        return None;
    }
    let id = find_int(params, MQIACF_BUFFER_POOL_ID)?.to_string();
    let free_percent = match (
        find_int(params, MQIACF_USAGE_FREE_BUFF),
        find_int(params, MQIACF_USAGE_TOTAL_BUFFERS),
    ) {
        (Some(free), Some(total)) if total > 0 => Some(free * 100 / total),
        _ => None,
    };
    Some(
        Row::new(&id, id.clone())
            .with(ATTR_BP_ID, StatusValue::Str(id.clone()))
            .with_opt_int(ATTR_BP_FREE_PERCENT, free_percent),
    )
}

pub fn identify_page_set(params: &[PcfParameter], _ctx: &ParseContext) -> Option<Row> {
    if !is_kind(params, MQIACF_USAGE_PAGESET) {
        return None;
    }
    let id = find_int(params, MQIA_PAGESET_ID)?.to_string();
    Some(Row::new(&id, id.clone()).with(ATTR_PS_ID, StatusValue::Str(id.clone())))
}
