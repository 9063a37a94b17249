//! Device directory unit tests

use keyvault::directory::{Device, DeviceDirectory};
use keyvault::errors::DirectoryError;
use keyvault::keys::ip::validate_ip_format;

fn ips(directory: &DeviceDirectory) -> Vec<&str> {
    directory.all().iter().map(|d| d.ip.as_str()).collect()
}

#[test]
fn test_add_then_find() {
    let mut directory = DeviceDirectory::new();
    directory.add(Device::new("10.1.1.1", "admin")).unwrap();

    let device = directory.find("10.1.1.1").unwrap();
    assert_eq!(device.username, "admin");
    assert!(directory.exists("10.1.1.1"));
}

#[test]
fn test_duplicate_add_leaves_directory_unchanged() {
    let mut directory = DeviceDirectory::new();
    directory.add(Device::new("10.1.1.1", "admin")).unwrap();

    let err = directory.add(Device::new("10.1.1.1", "other")).unwrap_err();
    assert_eq!(err, DirectoryError::DuplicateIp("10.1.1.1".to_string()));
    assert_eq!(directory.len(), 1);
    assert_eq!(directory.find("10.1.1.1").unwrap().username, "admin");
}

#[test]
fn test_remove_then_find() {
    let mut directory = DeviceDirectory::new();
    directory.add(Device::new("10.1.1.1", "admin")).unwrap();

    let removed = directory.remove("10.1.1.1").unwrap();
    assert_eq!(removed.ip, "10.1.1.1");
    assert!(directory.find("10.1.1.1").is_none());
    assert!(directory.is_empty());
}

#[test]
fn test_remove_unknown_leaves_directory_unchanged() {
    let mut directory = DeviceDirectory::new();
    directory.add(Device::new("10.1.1.1", "admin")).unwrap();

    let err = directory.remove("10.9.9.9").unwrap_err();
    assert_eq!(err, DirectoryError::NotFound("10.9.9.9".to_string()));
    assert_eq!(ips(&directory), vec!["10.1.1.1"]);
}

#[test]
fn test_iteration_follows_insertion_order() {
    let mut directory = DeviceDirectory::new();
    directory.add(Device::new("10.0.0.1", "a")).unwrap();
    directory.add(Device::new("10.0.0.2", "b")).unwrap();
    directory.remove("10.0.0.1").unwrap();
    directory.add(Device::new("10.0.0.3", "c")).unwrap();

    assert_eq!(ips(&directory), vec!["10.0.0.2", "10.0.0.3"]);
}

#[test]
fn test_seeded_keeps_seed_order() {
    let directory = DeviceDirectory::seeded(&[
        Device::new("192.0.2.10", "admin"),
        Device::new("192.0.2.11", "admin"),
        Device::new("192.0.2.10", "again"),
        Device::new("not-an-ip", "admin"),
    ]);
    assert_eq!(ips(&directory), vec!["192.0.2.10", "192.0.2.11"]);
}

#[test]
fn test_validate_ip_format() {
    for valid in ["0.0.0.0", "255.255.255.255", "10.0.0.1", "192.168.1.254"] {
        assert!(validate_ip_format(valid), "{valid} should be valid");
    }

    for invalid in [
        "",
        "10.0.0",
        "10.0.0.1.5",
        "10.0.0.256",
        "10.0.a.1",
        " 10.0.0.1",
        "10.0.0.1 ",
        "10.0.0.1/24",
        "10..0.1",
        "1000.0.0.1",
        "-1.0.0.1",
    ] {
        assert!(!validate_ip_format(invalid), "{invalid:?} should be invalid");
    }
}
