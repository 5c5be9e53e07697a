//! Unit tests for the Identifiers module

use core_kernel::{ProductId, InvoiceId, InvoiceItemId};
use uuid::Uuid;

#[test]
fn test_new_generates_unique_ids() {
    assert_ne!(ProductId::new(), ProductId::new());
}

#[test]
fn test_new_v7_generates_time_ordered_ids() {
    let id1 = InvoiceId::new_v7();
    std::thread::sleep(std::time::Duration::from_millis(2));
    let id2 = InvoiceId::new_v7();
    let uuid1: Uuid = id1.into();
    let uuid2: Uuid = id2.into();
    assert!(uuid1 < uuid2);
}

#[test]
fn test_prefixes() {
    assert_eq!(ProductId::prefix(), "PRD");
    assert_eq!(InvoiceId::prefix(), "IVC");
    assert_eq!(InvoiceItemId::prefix(), "IVI");
}

#[test]
fn test_from_str_rejects_garbage() {
    assert!("PRD-not-a-uuid".parse::<ProductId>().is_err());
}

#[test]
fn test_serde_is_transparent() {
    let uuid = Uuid::new_v4();
    let id = ProductId::from_uuid(uuid);
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, format!("\"{}\"", uuid));
}
