use std::path::Path;
use std::sync::OnceLock;

use tracing::debug;

/// Environment variable holding the encrypted store's decryption key.
pub const CREDENTIAL_KEY_ENV: &str = "TRELLIS_CREDENTIAL_KEY";

static BOOTSTRAPPED: OnceLock<bool> = OnceLock::new();

/// Load the credential key from shell config if not already in the
/// environment.
///
/// Credential setup writes the encryption key to `~/.zshrc` or
/// `~/.bashrc`. If the current shell hasn't sourced its config yet, this
/// reads the key directly and sets it in the process environment, so this
/// process and any subprocesses it spawns can unlock the encrypted store.
/// Only the credential key is loaded this way; every other secret comes
/// from the store itself.
///
/// Runs at most once per process and mutates nothing but the one
/// environment variable. Returns whether a value was freshly loaded.
pub fn ensure_credential_key_env() -> bool {
    *BOOTSTRAPPED.get_or_init(|| {
        let already_set = std::env::var(CREDENTIAL_KEY_ENV)
            .map(|v| !v.is_empty())
            .unwrap_or(false);
        if already_set {
            return false;
        }

        let Ok(home) = std::env::var("HOME") else {
            return false;
        };
        for file in [".zshrc", ".bashrc"] {
            let path = Path::new(&home).join(file);
            if let Some(value) = read_exported_var(&path, CREDENTIAL_KEY_ENV) {
                std::env::set_var(CREDENTIAL_KEY_ENV, &value);
                debug!(path = %path.display(), "Loaded credential key from shell config");
                return true;
            }
        }
        false
    })
}

fn read_exported_var(path: &Path, var: &str) -> Option<String> {
    let contents = std::fs::read_to_string(path).ok()?;
    parse_exported_var(&contents, var)
}

/// Find `export VAR=value` in shell config text. Handles double and
/// single quotes; ignores commented and unrelated lines.
fn parse_exported_var(contents: &str, var: &str) -> Option<String> {
    for line in contents.lines() {
        let line = line.trim();
        let Some(rest) = line.strip_prefix("export ") else {
            continue;
        };
        let Some(rest) = rest.trim_start().strip_prefix(var) else {
            continue;
        };
        let Some(value) = rest.strip_prefix('=') else {
            continue;
        };
        let value = value.trim();
        let value = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
            .unwrap_or(value);
        if !value.is_empty() {
            return Some(value.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_plain_export() {
        let contents = "alias ll='ls -l'\nexport TRELLIS_CREDENTIAL_KEY=abc123\n";
        assert_eq!(
            parse_exported_var(contents, "TRELLIS_CREDENTIAL_KEY"),
            Some("abc123".to_string())
        );
    }

    #[test]
    fn test_parse_quoted_exports() {
        assert_eq!(
            parse_exported_var("export KEY=\"quoted value\"", "KEY"),
            Some("quoted value".to_string())
        );
        assert_eq!(
            parse_exported_var("export KEY='single quoted'", "KEY"),
            Some("single quoted".to_string())
        );
    }

    #[test]
    fn test_parse_skips_unrelated_lines() {
        let contents = "\
# export KEY=commented
export OTHER_KEY=nope
export KEY_SUFFIXED=nope
KEY=not_exported
export KEY=
export KEY=real
";
        assert_eq!(
            parse_exported_var(contents, "KEY"),
            Some("real".to_string())
        );
    }

    #[test]
    fn test_parse_missing_var() {
        assert_eq!(parse_exported_var("export OTHER=x", "KEY"), None);
    }

    #[test]
    fn test_read_exported_var_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "export HISTSIZE=1000").unwrap();
        writeln!(file, "export MY_BOOT_KEY=\"from-config\"").unwrap();

        assert_eq!(
            read_exported_var(file.path(), "MY_BOOT_KEY"),
            Some("from-config".to_string())
        );
        assert_eq!(read_exported_var(file.path(), "ABSENT"), None);
        assert_eq!(
            read_exported_var(Path::new("/nonexistent/.zshrc"), "MY_BOOT_KEY"),
            None
        );
    }

    #[test]
    fn test_bootstrap_is_idempotent_when_key_present() {
        std::env::set_var(CREDENTIAL_KEY_ENV, "preset");
        assert!(!ensure_credential_key_env());
        assert!(!ensure_credential_key_env());
        assert_eq!(
            std::env::var(CREDENTIAL_KEY_ENV).unwrap(),
            "preset"
        );
        std::env::remove_var(CREDENTIAL_KEY_ENV);
    }
}
