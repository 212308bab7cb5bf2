//! FFI layer for the mobile shell.
//!
//! This module provides C-compatible functions that can be called via Dart FFI.
//! Drafts, records and reports cross the boundary as JSON strings.
//!
//! # Memory Management
//!
//! - Strings returned by `garage_*` functions are allocated by Rust
//! - Caller must free them with `garage_string_free`
//! - Handles from `garage_open` must be freed with `garage_close`
//!
//! # Error Handling
//!
//! Functions return JSON with either:
//! - `{"ok": <result>}` on success
//! - `{"error": "<message>", "kind": "<kind>"}` on failure, where `kind` is
//!   one of `validation`, `storage`, `serialization`, `quota` or `request`

use crate::{
    backend::FileStore, config::Config, error::StoreError, repository::Repository,
    telemetry::init_tracing,
};
use garage_engine::{
    CollectionKey, PartSaleDraft, Product, ProductDraft, RecordId, Vehicle, VehicleDraft,
    VehiclePart,
};
use serde::{de::DeserializeOwned, Serialize};
use std::ffi::{c_char, CStr, CString};
use std::ptr;
use tokio::runtime::Runtime;

/// An open repository plus the runtime its calls are driven on.
pub struct GarageHandle {
    runtime: Runtime,
    repo: Repository<FileStore>,
}

impl GarageHandle {
    fn open(config: &Config) -> Result<Self, String> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| format!("failed to start runtime: {e}"))?;

        let store = runtime
            .block_on(FileStore::open(&config.data_dir, config.max_value_bytes))
            .map_err(|e| e.to_string())?;

        Ok(Self {
            runtime,
            repo: Repository::new(store),
        })
    }
}

/// Result wrapper for FFI responses.
#[derive(Serialize)]
#[serde(untagged)]
enum FfiResult<T: Serialize> {
    Ok { ok: T },
    Err { error: String, kind: &'static str },
}

impl<T: Serialize> FfiResult<T> {
    fn ok(value: T) -> Self {
        FfiResult::Ok { ok: value }
    }

    fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"error":"serialization failed: {e}","kind":"serialization"}}"#)
        })
    }
}

impl FfiResult<()> {
    fn request(message: impl Into<String>) -> Self {
        FfiResult::Err {
            error: message.into(),
            kind: "request",
        }
    }

    fn store(err: &StoreError) -> Self {
        FfiResult::Err {
            error: err.to_string(),
            kind: err.kind(),
        }
    }
}

/// Convert a Rust string to a C string pointer.
/// Caller must free with `garage_string_free`.
fn to_c_string(s: String) -> *mut c_char {
    match CString::new(s) {
        Ok(cs) => cs.into_raw(),
        Err(_) => CString::from(
            c"{\"error\":\"string contained null bytes\",\"kind\":\"serialization\"}",
        )
        .into_raw(),
    }
}

/// Convert a C string pointer to a Rust string.
/// Returns None if pointer is null or invalid UTF-8.
unsafe fn from_c_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

fn request_error(message: impl Into<String>) -> *mut c_char {
    to_c_string(FfiResult::request(message).to_json())
}

fn respond<T: Serialize>(result: crate::Result<T>) -> *mut c_char {
    match result {
        Ok(value) => to_c_string(FfiResult::ok(value).to_json()),
        Err(e) => {
            tracing::warn!(error = %e, kind = e.kind(), "garage call failed");
            to_c_string(FfiResult::store(&e).to_json())
        }
    }
}

unsafe fn parse_json<T: DeserializeOwned>(json: *const c_char, what: &str) -> Result<T, String> {
    let text = from_c_string(json).ok_or_else(|| format!("invalid {what} JSON"))?;
    serde_json::from_str(&text).map_err(|e| format!("parse error: {e}"))
}

// ============================================================================
// Lifecycle
// ============================================================================

/// Open a file-backed repository.
///
/// # Arguments
/// - `data_dir`: directory holding the collection files, or null to read the
///   configuration from the environment
///
/// # Returns
/// Pointer to a handle, or null on failure.
///
/// # Safety
/// - `data_dir` must be a valid null-terminated C string or null
/// - Caller must free the returned pointer with `garage_close`
#[no_mangle]
pub unsafe extern "C" fn garage_open(data_dir: *const c_char) -> *mut GarageHandle {
    let config = if data_dir.is_null() {
        match Config::from_env() {
            Ok(config) => config,
            Err(e) => {
                init_tracing("garage_store=info");
                tracing::error!(error = %e, "invalid configuration");
                return ptr::null_mut();
            }
        }
    } else {
        match from_c_string(data_dir) {
            Some(dir) => Config::new(dir),
            None => return ptr::null_mut(),
        }
    };

    init_tracing(&config.log_filter);

    match GarageHandle::open(&config) {
        Ok(handle) => {
            tracing::info!(data_dir = %config.data_dir.display(), "opened garage store");
            Box::into_raw(Box::new(handle))
        }
        Err(e) => {
            tracing::error!(
                error = %e,
                data_dir = %config.data_dir.display(),
                "failed to open garage store"
            );
            ptr::null_mut()
        }
    }
}

/// Free a handle.
///
/// # Safety
/// - `handle` must be a valid pointer from `garage_open`
/// - Must not be called twice on the same pointer
#[no_mangle]
pub unsafe extern "C" fn garage_close(handle: *mut GarageHandle) {
    if !handle.is_null() {
        drop(Box::from_raw(handle));
    }
}

/// Free a string returned by a `garage_*` function.
///
/// # Safety
/// - `s` must be a valid pointer from a `garage_*` function
/// - Must not be called twice on the same pointer
#[no_mangle]
pub unsafe extern "C" fn garage_string_free(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

// ============================================================================
// Collections
// ============================================================================

/// Load a collection by its storage key.
///
/// An unreadable collection loads as empty.
///
/// # Returns
/// JSON string: `{"ok": [record, ...]}` or `{"error": ..., "kind": ...}`
///
/// # Safety
/// - `handle` must be a valid pointer from `garage_open` or null
/// - `key` must be a valid null-terminated C string or null
/// - Caller must free the returned string with `garage_string_free`
#[no_mangle]
pub unsafe extern "C" fn garage_load_collection(
    handle: *const GarageHandle,
    key: *const c_char,
) -> *mut c_char {
    let handle = match handle.as_ref() {
        Some(h) => h,
        None => return request_error("null handle pointer"),
    };

    let key: CollectionKey = match from_c_string(key).map(|k| k.parse()) {
        Some(Ok(key)) => key,
        Some(Err(e)) => return respond::<()>(Err(StoreError::from(e))),
        None => return request_error("invalid collection key"),
    };

    let repo = &handle.repo;
    let json = handle.runtime.block_on(async {
        match key {
            CollectionKey::Products | CollectionKey::ProductStock => {
                FfiResult::ok(repo.load_collection::<Product>(&key).await).to_json()
            }
            CollectionKey::Vehicles => {
                FfiResult::ok(repo.load_collection::<Vehicle>(&key).await).to_json()
            }
            CollectionKey::VehicleParts(_) => {
                FfiResult::ok(repo.load_collection::<VehiclePart>(&key).await).to_json()
            }
        }
    });
    to_c_string(json)
}

/// Validate a product draft and add it to the catalog.
///
/// # Returns
/// JSON string: `{"ok": Product}` or `{"error": ..., "kind": ...}`
///
/// # Safety
/// - `handle` must be a valid pointer from `garage_open` or null
/// - `draft_json` must be a valid null-terminated C string or null
/// - Caller must free the returned string with `garage_string_free`
#[no_mangle]
pub unsafe extern "C" fn garage_add_product(
    handle: *const GarageHandle,
    draft_json: *const c_char,
) -> *mut c_char {
    let handle = match handle.as_ref() {
        Some(h) => h,
        None => return request_error("null handle pointer"),
    };

    let draft: ProductDraft = match parse_json(draft_json, "product draft") {
        Ok(d) => d,
        Err(e) => return request_error(e),
    };

    respond(handle.runtime.block_on(handle.repo.add_product(draft)))
}

/// Validate a product draft and add it to stock.
///
/// # Returns
/// JSON string: `{"ok": Product}` or `{"error": ..., "kind": ...}`
///
/// # Safety
/// - `handle` must be a valid pointer from `garage_open` or null
/// - `draft_json` must be a valid null-terminated C string or null
/// - Caller must free the returned string with `garage_string_free`
#[no_mangle]
pub unsafe extern "C" fn garage_add_stock_product(
    handle: *const GarageHandle,
    draft_json: *const c_char,
) -> *mut c_char {
    let handle = match handle.as_ref() {
        Some(h) => h,
        None => return request_error("null handle pointer"),
    };

    let draft: ProductDraft = match parse_json(draft_json, "product draft") {
        Ok(d) => d,
        Err(e) => return request_error(e),
    };

    respond(handle.runtime.block_on(handle.repo.add_stock_product(draft)))
}

/// Remove a catalog product by id.
///
/// # Returns
/// JSON string: `{"ok": true}` if it was removed, `{"ok": false}` if absent
///
/// # Safety
/// - `handle` must be a valid pointer from `garage_open` or null
/// - Caller must free the returned string with `garage_string_free`
#[no_mangle]
pub unsafe extern "C" fn garage_remove_product(
    handle: *const GarageHandle,
    id: u64,
) -> *mut c_char {
    let handle = match handle.as_ref() {
        Some(h) => h,
        None => return request_error("null handle pointer"),
    };

    respond(
        handle
            .runtime
            .block_on(handle.repo.remove_product(RecordId::new(id))),
    )
}

/// Remove a stock product by id.
///
/// # Returns
/// JSON string: `{"ok": true}` if it was removed, `{"ok": false}` if absent
///
/// # Safety
/// - `handle` must be a valid pointer from `garage_open` or null
/// - Caller must free the returned string with `garage_string_free`
#[no_mangle]
pub unsafe extern "C" fn garage_remove_stock_product(
    handle: *const GarageHandle,
    id: u64,
) -> *mut c_char {
    let handle = match handle.as_ref() {
        Some(h) => h,
        None => return request_error("null handle pointer"),
    };

    respond(
        handle
            .runtime
            .block_on(handle.repo.remove_stock_product(RecordId::new(id))),
    )
}

// ============================================================================
// Vehicles
// ============================================================================

/// Validate a vehicle draft and add the vehicle.
///
/// # Returns
/// JSON string: `{"ok": Vehicle}` or `{"error": ..., "kind": ...}`
///
/// # Safety
/// - `handle` must be a valid pointer from `garage_open` or null
/// - `draft_json` must be a valid null-terminated C string or null
/// - Caller must free the returned string with `garage_string_free`
#[no_mangle]
pub unsafe extern "C" fn garage_add_vehicle(
    handle: *const GarageHandle,
    draft_json: *const c_char,
) -> *mut c_char {
    let handle = match handle.as_ref() {
        Some(h) => h,
        None => return request_error("null handle pointer"),
    };

    let draft: VehicleDraft = match parse_json(draft_json, "vehicle draft") {
        Ok(d) => d,
        Err(e) => return request_error(e),
    };

    respond(handle.runtime.block_on(handle.repo.add_vehicle(draft)))
}

/// Validate a part sale and record it against a vehicle.
///
/// # Returns
/// JSON string: `{"ok": VehiclePart}` or `{"error": ..., "kind": ...}`
///
/// # Safety
/// - `handle` must be a valid pointer from `garage_open` or null
/// - `draft_json` must be a valid null-terminated C string or null
/// - Caller must free the returned string with `garage_string_free`
#[no_mangle]
pub unsafe extern "C" fn garage_record_part_sale(
    handle: *const GarageHandle,
    vehicle_id: u64,
    draft_json: *const c_char,
) -> *mut c_char {
    let handle = match handle.as_ref() {
        Some(h) => h,
        None => return request_error("null handle pointer"),
    };

    let draft: PartSaleDraft = match parse_json(draft_json, "part sale draft") {
        Ok(d) => d,
        Err(e) => return request_error(e),
    };

    respond(
        handle
            .runtime
            .block_on(handle.repo.record_part_sale(RecordId::new(vehicle_id), draft)),
    )
}

// ============================================================================
// Reports
// ============================================================================

/// Stock totals and the most recent vehicle.
///
/// # Returns
/// JSON string: `{"ok": StockSummary}`
///
/// # Safety
/// - `handle` must be a valid pointer from `garage_open` or null
/// - Caller must free the returned string with `garage_string_free`
#[no_mangle]
pub unsafe extern "C" fn garage_stock_summary(handle: *const GarageHandle) -> *mut c_char {
    let handle = match handle.as_ref() {
        Some(h) => h,
        None => return request_error("null handle pointer"),
    };

    let summary = handle.runtime.block_on(handle.repo.compute_stock_summary());
    to_c_string(FfiResult::ok(summary).to_json())
}

/// Every part sold, newest first, with the grand total.
///
/// # Returns
/// JSON string: `{"ok": SalesReport}`
///
/// # Safety
/// - `handle` must be a valid pointer from `garage_open` or null
/// - Caller must free the returned string with `garage_string_free`
#[no_mangle]
pub unsafe extern "C" fn garage_sales_report(handle: *const GarageHandle) -> *mut c_char {
    let handle = match handle.as_ref() {
        Some(h) => h,
        None => return request_error("null handle pointer"),
    };

    let report = handle.runtime.block_on(handle.repo.compute_sales_report());
    to_c_string(FfiResult::ok(report).to_json())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    struct Opened {
        handle: *mut GarageHandle,
        _dir: tempfile::TempDir,
    }

    impl Drop for Opened {
        fn drop(&mut self) {
            unsafe { garage_close(self.handle) }
        }
    }

    fn open() -> Opened {
        let dir = tempfile::tempdir().unwrap();
        let path = CString::new(dir.path().to_str().unwrap()).unwrap();
        let handle = unsafe { garage_open(path.as_ptr()) };
        assert!(!handle.is_null());
        Opened { handle, _dir: dir }
    }

    /// Take ownership of a returned string and parse it.
    fn take(ptr: *mut c_char) -> Value {
        assert!(!ptr.is_null());
        let text = unsafe { CStr::from_ptr(ptr) }.to_str().unwrap().to_string();
        unsafe { garage_string_free(ptr) };
        serde_json::from_str(&text).unwrap()
    }

    fn c(value: Value) -> CString {
        CString::new(value.to_string()).unwrap()
    }

    #[test]
    fn add_and_load_stock() {
        let opened = open();
        let draft = c(json!({"name": "Brake pad", "price": "450.00", "quantity": "4"}));

        let added = take(unsafe { garage_add_stock_product(opened.handle, draft.as_ptr()) });
        assert_eq!(added["ok"]["name"], "Brake pad");
        assert_eq!(added["ok"]["quantity"], 4);

        let key = CString::new("productStock").unwrap();
        let loaded = take(unsafe { garage_load_collection(opened.handle, key.as_ptr()) });
        assert_eq!(loaded["ok"].as_array().unwrap().len(), 1);
        assert_eq!(loaded["ok"][0]["id"], added["ok"]["id"]);

        let summary = take(unsafe { garage_stock_summary(opened.handle) });
        assert_eq!(summary["ok"]["totalProducts"], 4);
        assert_eq!(summary["ok"]["totalEarnings"], "1800.00");
        assert_eq!(summary["ok"]["recentVehicle"], Value::Null);
    }

    #[test]
    fn validation_errors_carry_kind() {
        let opened = open();
        let draft = c(json!({"make": "Honda", "model": "", "registrationNumber": "KA01"}));

        let result = take(unsafe { garage_add_vehicle(opened.handle, draft.as_ptr()) });
        assert_eq!(result["kind"], "validation");
        assert_eq!(result["error"], "missing required field: model");
    }

    #[test]
    fn bad_requests() {
        let opened = open();

        let result = take(unsafe { garage_stock_summary(ptr::null()) });
        assert_eq!(result["kind"], "request");

        let garbage = CString::new("{not json").unwrap();
        let result = take(unsafe { garage_add_product(opened.handle, garbage.as_ptr()) });
        assert_eq!(result["kind"], "request");

        let result = take(unsafe { garage_add_product(opened.handle, ptr::null()) });
        assert_eq!(result["kind"], "request");

        let key = CString::new("customers").unwrap();
        let result = take(unsafe { garage_load_collection(opened.handle, key.as_ptr()) });
        assert_eq!(result["kind"], "validation");
    }

    #[test]
    fn part_sales_show_up_in_report() {
        let opened = open();
        let vehicle = c(json!({
            "make": "Hyundai",
            "model": "i20",
            "registrationNumber": "KA05MN1234"
        }));
        let vehicle = take(unsafe { garage_add_vehicle(opened.handle, vehicle.as_ptr()) });
        let vehicle_id = vehicle["ok"]["id"].as_u64().unwrap();

        let sale = c(json!({"name": "Wiper", "price": "120", "quantity": "2"}));
        let part =
            take(unsafe { garage_record_part_sale(opened.handle, vehicle_id, sale.as_ptr()) });
        assert_eq!(part["ok"]["totalCost"], "240");

        let report = take(unsafe { garage_sales_report(opened.handle) });
        let rows = report["ok"]["rows"].as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["vehicleMake"], "Hyundai");
        assert_eq!(rows[0]["name"], "Wiper");
        assert_eq!(report["ok"]["totalSales"], "240");

        let missing = c(json!({"name": "Wiper", "price": "120", "quantity": "1"}));
        let result = take(unsafe {
            garage_record_part_sale(opened.handle, vehicle_id + 1, missing.as_ptr())
        });
        assert_eq!(result["kind"], "validation");
    }

    #[test]
    fn remove_reports_presence() {
        let opened = open();
        let draft = c(json!({"name": "Fuse", "price": "5", "quantity": "10"}));
        let added = take(unsafe { garage_add_product(opened.handle, draft.as_ptr()) });
        let id = added["ok"]["id"].as_u64().unwrap();

        assert_eq!(take(unsafe { garage_remove_product(opened.handle, id) })["ok"], true);
        assert_eq!(take(unsafe { garage_remove_product(opened.handle, id) })["ok"], false);
        assert_eq!(
            take(unsafe { garage_remove_stock_product(opened.handle, id) })["ok"],
            false
        );
    }

    // The only test that touches process environment variables.
    #[test]
    fn open_without_path_reads_environment() {
        let dir = tempfile::tempdir().unwrap();

        std::env::set_var("GARAGE_DATA_DIR", dir.path());
        std::env::set_var("GARAGE_MAX_VALUE_BYTES", "lots");
        let rejected = unsafe { garage_open(ptr::null()) };

        std::env::set_var("GARAGE_MAX_VALUE_BYTES", "0");
        let handle = unsafe { garage_open(ptr::null()) };

        std::env::remove_var("GARAGE_DATA_DIR");
        std::env::remove_var("GARAGE_MAX_VALUE_BYTES");

        assert!(rejected.is_null());
        assert!(!handle.is_null());

        let draft = c(json!({"name": "Relay", "price": "80", "quantity": "3"}));
        let added = take(unsafe { garage_add_product(handle, draft.as_ptr()) });
        unsafe { garage_close(handle) };

        assert_eq!(added["ok"]["name"], "Relay");
        assert!(dir.path().join("products.json").exists());
    }
}
