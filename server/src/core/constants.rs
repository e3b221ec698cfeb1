// =============================================================================
// Application Identity
// =============================================================================

/// Application name in title case (for display)
pub const APP_NAME: &str = "AuditQuery";

/// Application name in lowercase (for paths and identifiers)
pub const APP_NAME_LOWER: &str = "auditquery";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".auditquery";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "auditquery.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "AUDITQUERY_CONFIG";

// =============================================================================
// Environment Variables - Server
// =============================================================================

/// Environment variable for server host
pub const ENV_HOST: &str = "AUDITQUERY_HOST";

/// Environment variable for server port
pub const ENV_PORT: &str = "AUDITQUERY_PORT";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "AUDITQUERY_LOG";

// =============================================================================
// Server Defaults
// =============================================================================

/// Default server host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port
pub const DEFAULT_PORT: u16 = 5390;

/// Default request body limit (1 MiB)
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

// =============================================================================
// Environment Variables - Store
// =============================================================================

/// Environment variable for the audit table name
pub const ENV_TABLE: &str = "AUDITQUERY_TABLE";

/// Legacy environment variable for the audit table name
pub const ENV_TABLE_FALLBACK: &str = "AUDIT_TABLE";

/// Environment variable for the AWS region
pub const ENV_REGION: &str = "AUDITQUERY_REGION";

/// Environment variable for a custom DynamoDB endpoint (DynamoDB Local, LocalStack)
pub const ENV_ENDPOINT: &str = "AUDITQUERY_ENDPOINT";

/// Environment variable for the range bound mode (`filter` or `key_condition`)
pub const ENV_RANGE_MODE: &str = "AUDITQUERY_RANGE_MODE";

// =============================================================================
// Store Defaults
// =============================================================================

/// Default audit table
pub const DEFAULT_AUDIT_TABLE: &str = "user_audit_table";

/// Suffix appended to an index field to name its secondary index
pub const INDEX_NAME_SUFFIX: &str = "-index";

/// Fields that select a secondary index, in priority order
pub const DEFAULT_INDEX_FIELDS: &[&str] = &["userId", "applicationId", "resourceId"];

/// Attribute that `startDate`/`endDate` bound
pub const DEFAULT_RANGE_ATTRIBUTE: &str = "eventTimestamp";

/// Attributes returned by audit queries and scans
pub const AUDIT_PROJECTION: &[&str] = &[
    "auditId",
    "userId",
    "applicationId",
    "resourceId",
    "eventTimestamp",
    "systemId",
    "systemName",
    "environment",
    "email",
    "role",
    "actionType",
    "resourceType",
    "actionDescription",
    "dataBefore",
    "dataAfter",
    "retentionPeriodInYears",
    "deletionDate",
];

// =============================================================================
// Request Parameters
// =============================================================================

/// Pagination token
pub const PARAM_NEXT_TOKEN: &str = "nextToken";

/// Page size
pub const PARAM_LIMIT: &str = "limit";

/// Strongly consistent read flag (presence only)
pub const PARAM_CONSISTENT_READ: &str = "consistentRead";

/// Target table for the dynamic table scan
pub const PARAM_TABLE_NAME: &str = "tableName";

/// Target index for the dynamic table scan
pub const PARAM_INDEX_NAME: &str = "indexName";

/// Inclusive lower date bound
pub const PARAM_START_DATE: &str = "startDate";

/// Inclusive upper date bound
pub const PARAM_END_DATE: &str = "endDate";

/// Largest page size a caller may request
pub const MAX_QUERY_LIMIT: u32 = 1000;
