//! Centralized default constants for the innboard system.
//!
//! **This module is the single source of truth** for all shared default
//! values. Crates reference these constants instead of defining their own
//! magic numbers.

// =============================================================================
// SIGNED URL GRANTS
// =============================================================================

/// Validity window of a signed retrieval URL, in seconds (one hour).
///
/// Grants are recomputed on every read; two reads at different instants
/// produce different grant values for the same document.
pub const URL_TTL_SECS: i64 = 3600;

/// Validity window of the long-lived fallback URL recorded in the
/// `signed_document` row at sign time, in seconds (thirty days). Used
/// only when grant recomputation fails during rehydration.
pub const STATIC_URL_TTL_SECS: i64 = 30 * 24 * 3600;

// =============================================================================
// TIMEOUTS
// =============================================================================

/// Per-attachment fetch timeout, in seconds. A slow or unreachable
/// attachment is skipped rather than stalling the whole sign flow.
pub const ATTACHMENT_FETCH_TIMEOUT_SECS: u64 = 10;

/// Final artifact upload timeout, in seconds.
pub const UPLOAD_TIMEOUT_SECS: u64 = 30;

/// Upload-log metadata lookup timeout, in seconds. Resolution is
/// best-effort; a stalled lookup degrades to "not found".
pub const METADATA_LOOKUP_TIMEOUT_SECS: u64 = 5;

// =============================================================================
// PAGE GEOMETRY (PDF points, US Letter)
// =============================================================================

/// Page width in points (8.5in × 72).
pub const PAGE_WIDTH_PT: f64 = 612.0;

/// Page height in points (11in × 72).
pub const PAGE_HEIGHT_PT: f64 = 792.0;

/// Left/right page margin in points.
pub const PAGE_MARGIN_PT: f64 = 54.0;

// =============================================================================
// SIGNATURE PLACEMENT
// =============================================================================

/// 1-based page number the signature is stamped on.
pub const SIGNATURE_PAGE: u32 = 1;

/// X coordinate (points, from page left) of the signature rectangle.
pub const SIGNATURE_X_PT: f64 = 72.0;

/// Y coordinate (points, from page bottom) of the signature rectangle.
pub const SIGNATURE_Y_PT: f64 = 90.0;

/// Signature rectangle width in points.
pub const SIGNATURE_WIDTH_PT: f64 = 180.0;

/// Signature rectangle height in points.
pub const SIGNATURE_HEIGHT_PT: f64 = 54.0;

// =============================================================================
// TENANT NAME CACHE
// =============================================================================

/// Capacity of the per-process tenant-name read-through cache.
pub const TENANT_CACHE_CAPACITY: usize = 256;
