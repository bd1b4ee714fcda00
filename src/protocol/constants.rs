//! Numeric constants of the PCF administrative protocol
//!
//! Names follow the broker's own vocabulary so that values can be checked
//! against its published header files. Only the subset the collector sends
//! or interprets is listed.

#![allow(missing_docs)]

// Structure types
pub const MQCFT_NONE: i32 = 0;
pub const MQCFT_COMMAND: i32 = 1;
pub const MQCFT_RESPONSE: i32 = 2;
pub const MQCFT_INTEGER: i32 = 3;
pub const MQCFT_STRING: i32 = 4;
pub const MQCFT_INTEGER_LIST: i32 = 5;
pub const MQCFT_STRING_LIST: i32 = 6;
pub const MQCFT_EVENT: i32 = 7;
pub const MQCFT_BYTE_STRING: i32 = 9;
pub const MQCFT_INTEGER_FILTER: i32 = 13;
pub const MQCFT_STRING_FILTER: i32 = 14;
pub const MQCFT_COMMAND_XR: i32 = 16;
pub const MQCFT_XR_MSG: i32 = 17;
pub const MQCFT_XR_ITEM: i32 = 18;
pub const MQCFT_XR_SUMMARY: i32 = 19;
pub const MQCFT_GROUP: i32 = 20;
pub const MQCFT_STATISTICS: i32 = 21;
pub const MQCFT_INTEGER64: i32 = 23;
pub const MQCFT_INTEGER64_LIST: i32 = 25;
pub const MQCFT_STATUS: i32 = 27;

// Structure lengths
pub const MQCFH_STRUC_LENGTH: usize = 36;
pub const MQCFH_VERSION_1: i32 = 1;
pub const MQCFH_VERSION_3: i32 = 3;
pub const MQCFIN_STRUC_LENGTH: usize = 16;
pub const MQCFIN64_STRUC_LENGTH: usize = 24;
pub const MQCFST_STRUC_LENGTH_FIXED: usize = 20;
pub const MQCFIL_STRUC_LENGTH_FIXED: usize = 16;
pub const MQCFIL64_STRUC_LENGTH_FIXED: usize = 16;
pub const MQCFSL_STRUC_LENGTH_FIXED: usize = 24;
pub const MQCFBS_STRUC_LENGTH_FIXED: usize = 16;
pub const MQCFGR_STRUC_LENGTH: usize = 16;
pub const MQCFIF_STRUC_LENGTH: usize = 20;
pub const MQCFSF_STRUC_LENGTH_FIXED: usize = 24;

// Control flags
pub const MQCFC_NOT_LAST: i32 = 0;
pub const MQCFC_LAST: i32 = 1;

// Filter operators
pub const MQCFOP_EQUAL: i32 = 2;
pub const MQCFOP_LIKE: i32 = 18;
pub const MQCFOP_NOT_LIKE: i32 = 21;

// Completion and reason codes
pub const MQCC_OK: i32 = 0;
pub const MQCC_WARNING: i32 = 1;
pub const MQCC_FAILED: i32 = 2;
pub const MQCC_UNKNOWN: i32 = -1;

pub const MQRC_NONE: i32 = 0;
pub const MQRC_CONNECTION_BROKEN: i32 = 2009;
pub const MQRC_NO_MSG_AVAILABLE: i32 = 2033;
pub const MQRC_NOT_AUTHORIZED: i32 = 2035;
pub const MQRC_Q_MGR_NAME_ERROR: i32 = 2058;
pub const MQRC_Q_MGR_NOT_AVAILABLE: i32 = 2059;
pub const MQRC_TRUNCATED_MSG_FAILED: i32 = 2080;
pub const MQRC_UNKNOWN_OBJECT_NAME: i32 = 2085;
pub const MQRC_HANDLE_NOT_AVAILABLE: i32 = 2017;
pub const MQRC_HOBJ_ERROR: i32 = 2019;
pub const MQRC_SUB_ALREADY_EXISTS: i32 = 2432;
pub const MQRC_NO_SUBSCRIPTION: i32 = 2428;
pub const MQRC_HOST_NOT_AVAILABLE: i32 = 2538;
pub const MQRCCF_NONE_FOUND: i32 = 3200;
pub const MQRCCF_CHL_STATUS_NOT_FOUND: i32 = 4067;
pub const MQRCCF_Q_MGR_CCSID_ERROR: i32 = 3178;

// Commands
pub const MQCMD_INQUIRE_Q_MGR: i32 = 2;
pub const MQCMD_INQUIRE_Q: i32 = 13;
pub const MQCMD_RESET_Q_STATS: i32 = 17;
pub const MQCMD_INQUIRE_Q_NAMES: i32 = 18;
pub const MQCMD_INQUIRE_CHANNEL_NAMES: i32 = 20;
pub const MQCMD_INQUIRE_CHANNEL: i32 = 25;
pub const MQCMD_INQUIRE_Q_STATUS: i32 = 41;
pub const MQCMD_INQUIRE_CHANNEL_STATUS: i32 = 42;
pub const MQCMD_INQUIRE_CLUSTER_Q_MGR: i32 = 70;
pub const MQCMD_INQUIRE_USAGE: i32 = 126;
pub const MQCMD_INQUIRE_Q_MGR_STATUS: i32 = 161;
pub const MQCMD_INQUIRE_SUBSCRIPTION: i32 = 176;
pub const MQCMD_INQUIRE_SUB_STATUS: i32 = 182;
pub const MQCMD_INQUIRE_TOPIC_STATUS: i32 = 183;

// Command levels
pub const MQCMDL_LEVEL_800: i32 = 800;
pub const MQCMDL_LEVEL_900: i32 = 900;
pub const MQCMDL_LEVEL_920: i32 = 920;

// Platforms
pub const MQPL_ZOS: i32 = 1;
pub const MQPL_OS2: i32 = 2;
pub const MQPL_UNIX: i32 = 3;
pub const MQPL_OS400: i32 = 4;
pub const MQPL_WINDOWS: i32 = 5;
pub const MQPL_WINDOWS_NT: i32 = 11;
pub const MQPL_NSK: i32 = 13;
pub const MQPL_APPLIANCE: i32 = 28;

// Queue manager and queue attributes (integer)
pub const MQIA_CURRENT_Q_DEPTH: i32 = 3;
pub const MQIA_MAX_HANDLES: i32 = 11;
pub const MQIA_USAGE: i32 = 12;
pub const MQIA_MAX_Q_DEPTH: i32 = 15;
pub const MQIA_OPEN_INPUT_COUNT: i32 = 17;
pub const MQIA_OPEN_OUTPUT_COUNT: i32 = 18;
pub const MQIA_Q_TYPE: i32 = 20;
pub const MQIA_COMMAND_LEVEL: i32 = 31;
pub const MQIA_PLATFORM: i32 = 32;
pub const MQIA_TIME_SINCE_RESET: i32 = 35;
pub const MQIA_HIGH_Q_DEPTH: i32 = 36;
pub const MQIA_MSG_ENQ_COUNT: i32 = 37;
pub const MQIA_MSG_DEQ_COUNT: i32 = 38;
pub const MQIA_PAGESET_ID: i32 = 62;
pub const MQIA_MONITORING_Q: i32 = 123;
pub const MQIA_SUB_COUNT: i32 = 204;
pub const MQIA_PUB_COUNT: i32 = 215;

// Queue manager and queue attributes (string)
pub const MQCA_Q_DESC: i32 = 2013;
pub const MQCA_Q_MGR_NAME: i32 = 2015;
pub const MQCA_Q_NAME: i32 = 2016;
pub const MQCA_REMOTE_Q_MGR_NAME: i32 = 2017;
pub const MQCA_CLUSTER_NAME: i32 = 2029;
pub const MQCA_CLUSTER_Q_MGR_NAME: i32 = 2031;
pub const MQCA_TOPIC_STRING: i32 = 2094;

// Command-format integer parameters
pub const MQIACF_Q_MGR_ATTRS: i32 = 1001;
pub const MQIACF_Q_ATTRS: i32 = 1002;
pub const MQIACF_ALL: i32 = 1009;
pub const MQIACF_CHANNEL_ATTRS: i32 = 1015;
pub const MQIACF_Q_STATUS_ATTRS: i32 = 1026;
pub const MQIACF_UNCOMMITTED_MSGS: i32 = 1027;
pub const MQIACF_Q_MGR_TYPE: i32 = 1085;
pub const MQIACF_CLUSTER_Q_MGR_ATTRS: i32 = 1093;
pub const MQIACF_SUSPEND: i32 = 1087;
pub const MQIACF_Q_STATUS_TYPE: i32 = 1103;
pub const MQIACF_Q_HANDLE: i32 = 1104;
pub const MQIACF_Q_STATUS: i32 = 1105;
pub const MQIACF_Q_MGR_STATUS: i32 = 1149;
pub const MQIACF_USAGE_TYPE: i32 = 1157;
pub const MQIACF_BUFFER_POOL_ID: i32 = 1158;
pub const MQIACF_USAGE_TOTAL_PAGES: i32 = 1159;
pub const MQIACF_USAGE_UNUSED_PAGES: i32 = 1160;
pub const MQIACF_USAGE_PERSIST_PAGES: i32 = 1161;
pub const MQIACF_USAGE_NONPERSIST_PAGES: i32 = 1162;
pub const MQIACF_USAGE_EXPAND_COUNT: i32 = 1164;
pub const MQIACF_PAGESET_STATUS: i32 = 1165;
pub const MQIACF_USAGE_TOTAL_BUFFERS: i32 = 1166;
pub const MQIACF_USAGE_PAGESET: i32 = 1168;
pub const MQIACF_USAGE_BUFFER_POOL: i32 = 1170;
pub const MQIACF_TOPIC_STATUS_TYPE: i32 = 1185;
pub const MQIACF_TOPIC_STATUS: i32 = 1186;
pub const MQIACF_TOPIC_SUB: i32 = 1187;
pub const MQIACF_TOPIC_PUB: i32 = 1188;
pub const MQIACF_Q_TIME_INDICATOR: i32 = 1226;
pub const MQIACF_OLDEST_MSG_AGE: i32 = 1227;
pub const MQIACF_CONNECTION_COUNT: i32 = 1229;
// Request selector sharing its value with the reply field above
pub const MQIACF_Q_MGR_STATUS_ATTRS: i32 = 1229;
pub const MQIACF_CHINIT_STATUS: i32 = 1232;
pub const MQIACF_CMD_SERVER_STATUS: i32 = 1233;
pub const MQIACF_DURABLE_SUBSCRIPTION: i32 = 1274;
pub const MQIACF_SUB_TYPE: i32 = 1289;
pub const MQIACF_MESSAGE_COUNT: i32 = 1290;
pub const MQIACF_PUBLISH_COUNT: i32 = 1310;
pub const MQIACF_USAGE_FREE_BUFF: i32 = 1330;
pub const MQIACF_BUFFER_POOL_LOCATION: i32 = 1332;
pub const MQIACF_PAGECLAS: i32 = 1333;
pub const MQIACF_USAGE_EXPAND_TYPE: i32 = 1334;
pub const MQIACF_CUR_Q_FILE_SIZE: i32 = 1437;
pub const MQIACF_CUR_MAX_FILE_SIZE: i32 = 1438;

// Command-format string parameters
pub const MQCACF_Q_NAMES: i32 = 3011;
pub const MQCACF_LAST_PUT_DATE: i32 = 3128;
pub const MQCACF_LAST_PUT_TIME: i32 = 3129;
pub const MQCACF_LAST_GET_DATE: i32 = 3130;
pub const MQCACF_LAST_GET_TIME: i32 = 3131;
pub const MQCACF_SUB_NAME: i32 = 3152;
pub const MQCACF_LAST_PUB_DATE: i32 = 3163;
pub const MQCACF_LAST_PUB_TIME: i32 = 3164;
pub const MQCACF_LAST_MSG_TIME: i32 = 3167;
pub const MQCACF_LAST_MSG_DATE: i32 = 3168;
pub const MQCACF_Q_MGR_START_DATE: i32 = 3175;
pub const MQCACF_Q_MGR_START_TIME: i32 = 3176;

// Channel parameters
pub const MQIACH_CHANNEL_TYPE: i32 = 1511;
pub const MQIACH_CHANNEL_INSTANCE_TYPE: i32 = 1523;
pub const MQIACH_CHANNEL_INSTANCE_ATTRS: i32 = 1524;
pub const MQIACH_CHANNEL_STATUS: i32 = 1527;
pub const MQIACH_MSGS: i32 = 1534;
pub const MQIACH_BYTES_SENT: i32 = 1535;
pub const MQIACH_BYTES_RECEIVED: i32 = 1536;
pub const MQIACH_BATCHES: i32 = 1537;
pub const MQIACH_BUFFERS_SENT: i32 = 1538;
pub const MQIACH_BUFFERS_RECEIVED: i32 = 1539;
pub const MQIACH_BATCH_SIZE_INDICATOR: i32 = 1583;
pub const MQIACH_NETWORK_TIME_INDICATOR: i32 = 1588;
pub const MQIACH_XMITQ_TIME_INDICATOR: i32 = 1590;
pub const MQIACH_CHANNEL_SUBSTATE: i32 = 1609;
pub const MQIACH_CURRENT_SHARING_CONVS: i32 = 1617;
pub const MQIACH_MAX_INSTANCES: i32 = 1618;
pub const MQIACH_MAX_INSTS_PER_CLIENT: i32 = 1619;
pub const MQIACH_MSGS_SENT: i32 = 1640;
pub const MQIACH_MSGS_RECEIVED: i32 = 1641;
pub const MQIACH_CONNECTION_COUNT: i32 = 1642;

pub const MQCACH_CHANNEL_NAME: i32 = 3501;
pub const MQCACH_DESC: i32 = 3502;
pub const MQCACH_CONNECTION_NAME: i32 = 3506;
pub const MQCACH_CHANNEL_NAMES: i32 = 3512;
pub const MQCACH_LAST_MSG_TIME: i32 = 3524;
pub const MQCACH_LAST_MSG_DATE: i32 = 3525;
pub const MQCACH_MCA_JOB_NAME: i32 = 3530;
pub const MQCACH_CLIENT_ID: i32 = 3604;

// Byte-string parameters
pub const MQBACF_SUB_ID: i32 = 7016;

// Channel types
pub const MQCHT_SENDER: i32 = 1;
pub const MQCHT_SERVER: i32 = 2;
pub const MQCHT_RECEIVER: i32 = 3;
pub const MQCHT_REQUESTER: i32 = 4;
pub const MQCHT_ALL: i32 = 5;
pub const MQCHT_CLNTCONN: i32 = 6;
pub const MQCHT_SVRCONN: i32 = 7;
pub const MQCHT_CLUSRCVR: i32 = 8;
pub const MQCHT_CLUSSDR: i32 = 9;
pub const MQCHT_MQTT: i32 = 10;
pub const MQCHT_AMQP: i32 = 11;

// Channel status
pub const MQCHS_INACTIVE: i32 = 0;
pub const MQCHS_BINDING: i32 = 1;
pub const MQCHS_STARTING: i32 = 2;
pub const MQCHS_RUNNING: i32 = 3;
pub const MQCHS_STOPPING: i32 = 4;
pub const MQCHS_RETRYING: i32 = 5;
pub const MQCHS_STOPPED: i32 = 6;
pub const MQCHS_REQUESTING: i32 = 7;
pub const MQCHS_PAUSED: i32 = 8;
pub const MQCHS_DISCONNECTED: i32 = 9;
pub const MQCHS_INITIALIZING: i32 = 13;
pub const MQCHS_SWITCHING: i32 = 14;

// Channel instance types
pub const MQOT_CURRENT_CHANNEL: i32 = 1011;
pub const MQOT_SAVED_CHANNEL: i32 = 1012;

// Queue types and usage
pub const MQQT_LOCAL: i32 = 1;
pub const MQQT_MODEL: i32 = 2;
pub const MQQT_ALIAS: i32 = 3;
pub const MQQT_REMOTE: i32 = 6;
pub const MQQT_CLUSTER: i32 = 7;
pub const MQQT_ALL: i32 = 1001;
pub const MQUS_NORMAL: i32 = 0;
pub const MQUS_TRANSMISSION: i32 = 1;

// Monitoring levels
pub const MQMON_NONE: i32 = -1;
pub const MQMON_OFF: i32 = 0;
pub const MQMON_ON: i32 = 1;

// Queue manager and service status
pub const MQQMSTA_STARTING: i32 = 1;
pub const MQQMSTA_RUNNING: i32 = 2;
pub const MQQMSTA_QUIESCING: i32 = 3;
pub const MQQMSTA_STANDBY: i32 = 4;
pub const MQSVC_STATUS_STOPPED: i32 = 0;
pub const MQSVC_STATUS_STARTING: i32 = 1;
pub const MQSVC_STATUS_RUNNING: i32 = 2;
pub const MQSVC_STATUS_STOPPING: i32 = 3;
pub const MQSVC_STATUS_RETRYING: i32 = 4;

// Resource monitoring publications
pub const MQIAMO_MONITOR_CLASS: i32 = 839;
pub const MQIAMO_MONITOR_TYPE: i32 = 840;
pub const MQIAMO_MONITOR_ELEMENT: i32 = 841;
pub const MQIAMO_MONITOR_DATATYPE: i32 = 842;
pub const MQIAMO_MONITOR_FLAGS: i32 = 843;
pub const MQIAMO64_MONITOR_INTERVAL: i32 = 845;
pub const MQCAMO_MONITOR_CLASS: i32 = 2713;
pub const MQCAMO_MONITOR_TYPE: i32 = 2714;
pub const MQCAMO_MONITOR_DESC: i32 = 2715;
pub const MQGACF_MONITOR_CLASS: i32 = 8015;
pub const MQGACF_MONITOR_TYPE: i32 = 8016;
pub const MQGACF_MONITOR_ELEMENT: i32 = 8017;

pub const MQIAMO_MONITOR_FLAGS_NONE: i32 = 0;
pub const MQIAMO_MONITOR_FLAGS_OBJNAME: i32 = 1;

pub const MQIAMO_MONITOR_UNIT: i32 = 1;
pub const MQIAMO_MONITOR_DELTA: i32 = 2;
pub const MQIAMO_MONITOR_HUNDREDTHS: i32 = 100;
pub const MQIAMO_MONITOR_KB: i32 = 1024;
pub const MQIAMO_MONITOR_PERCENT: i32 = 10000;
pub const MQIAMO_MONITOR_MICROSEC: i32 = 1_000_000;
pub const MQIAMO_MONITOR_MB: i32 = 1_048_576;
pub const MQIAMO_MONITOR_GB: i32 = 100_000_000;

// Message formats
pub const MQFMT_ADMIN: &str = "MQADMIN ";
pub const MQFMT_NONE: &str = "        ";

/// Length of a message or correlation identifier
pub const MQ_MSG_ID_LENGTH: usize = 24;
/// Padded length of an object name in requests
pub const MQ_OBJECT_NAME_LENGTH: usize = 48;
pub const MQ_Q_MGR_NAME_LENGTH: usize = 48;
pub const MQ_CHANNEL_NAME_LENGTH: usize = 20;
