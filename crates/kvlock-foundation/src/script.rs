//! Server-side scripts evaluated by script-capable stores

/// Lua script releasing a lock
///
/// Deletes `KEYS[1]` only when its value equals `ARGV[1]` and returns the
/// number of keys removed (1 or 0). Running as one script keeps the read
/// and the delete in a single atomic step on the server.
pub const COMPARE_AND_DELETE_SCRIPT: &str = r#"
if redis.call("get", KEYS[1]) == ARGV[1] then
    return redis.call("del", KEYS[1])
else
    return 0
end
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_compares_before_delete() {
        let get = COMPARE_AND_DELETE_SCRIPT.find("\"get\"").unwrap();
        let del = COMPARE_AND_DELETE_SCRIPT.find("\"del\"").unwrap();
        assert!(get < del);
        assert!(COMPARE_AND_DELETE_SCRIPT.contains("ARGV[1]"));
        assert!(COMPARE_AND_DELETE_SCRIPT.contains("return 0"));
    }
}
