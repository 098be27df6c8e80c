//! Structured logging schema and field name constants for innboard.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation tools can query by standardized field names across
//! every subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention (failed persistence, tenant fallback) |
//! | WARN  | Recoverable issue, automatic fallback applied (skipped attachment, preview degrade) |
//! | INFO  | Lifecycle events (startup, shutdown), operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-page iteration, high-volume data |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID propagated across request → pipeline → sub-calls.
/// Format: UUIDv7 (time-ordered).
pub const REQUEST_ID: &str = "request_id";

/// Subsystem originating the log event.
/// Values: "api", "pdf", "db", "storage"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "renderer", "embedder", "merger", "gateway", "rehydrate"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "render", "embed_signature", "merge", "persist", "rehydrate"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Employee UUID the document belongs to.
pub const EMPLOYEE_ID: &str = "employee_id";

/// Tenant (property) UUID used for storage namespacing.
pub const TENANT_ID: &str = "tenant_id";

/// Form kind being generated ("w4", "direct_deposit", ...).
pub const FORM_TYPE: &str = "form_type";

/// Attachment slot name ("primary", "secondary").
pub const SLOT: &str = "slot";

/// Uploaded attachment UUID.
pub const ATTACHMENT_ID: &str = "attachment_id";

/// Object storage path of an artifact or attachment.
pub const STORAGE_PATH: &str = "storage_path";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of pages in a rendered or merged artifact.
pub const PAGE_COUNT: &str = "page_count";

/// Byte length of a generated artifact or fetched attachment.
pub const BYTE_LEN: &str = "byte_len";
