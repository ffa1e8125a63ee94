//! Logical document paths for the synchronization store
//!
//! Vendor-agnostic path layout:
//! `users/{uid}` / `users/{uid}/devices/{deviceId}` /
//! `users/{uid}/devices/{deviceId}/commands/{cmdId}`

/// Path of a user record
pub fn user(uid: &str) -> String {
    format!("users/{uid}")
}

/// Path of a device's status projection document
pub fn device(uid: &str, device_id: &str) -> String {
    format!("users/{uid}/devices/{device_id}")
}

/// Path of a device's command collection
pub fn commands(uid: &str, device_id: &str) -> String {
    format!("users/{uid}/devices/{device_id}/commands")
}

/// Path of a single command document
pub fn command(uid: &str, device_id: &str, cmd_id: &str) -> String {
    format!("users/{uid}/devices/{device_id}/commands/{cmd_id}")
}

/// Wake topic addressed to every registered listener of one device
pub fn device_topic(device_id: &str) -> String {
    format!("device-{device_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_layout() {
        assert_eq!(user("u1"), "users/u1");
        assert_eq!(device("u1", "d1"), "users/u1/devices/d1");
        assert_eq!(commands("u1", "d1"), "users/u1/devices/d1/commands");
        assert_eq!(command("u1", "d1", "c1"), "users/u1/devices/d1/commands/c1");
    }

    #[test]
    fn test_command_path_is_under_collection() {
        let collection = commands("u1", "d1");
        assert_eq!(command("u1", "d1", "c1"), format!("{collection}/c1"));
    }
}
