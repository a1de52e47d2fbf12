#![no_main]

use libfuzzer_sys::fuzz_target;
use octo_commands::parse_command;

fuzz_target!(|data: &[u8]| {
    let raw = String::from_utf8_lossy(data);
    if let Some(parsed) = parse_command(&raw) {
        assert!(!parsed.command.is_empty());
        assert!(parsed
            .command
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_'));
        if let Some(args) = parsed.args {
            assert!(!args.is_empty());
            assert_eq!(args, args.trim());
        }
        assert!(raw.trim().starts_with('/'));
    }
});
