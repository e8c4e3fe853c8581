//! Azure CLI command execution.
//!
//! Used to borrow an access token from an `az login` session.

use crate::error::{Error, Result};
use colored::Colorize;
use regex::Regex;
use std::sync::OnceLock;
use tokio::process::Command;

/// Upper bound on accepted stdout, in bytes.
const MAX_OUTPUT_BYTES: usize = 500_000;

/// Regex for splitting command strings while preserving quoted substrings.
static COMMAND_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_command_regex() -> &'static Regex {
    COMMAND_REGEX.get_or_init(|| {
        Regex::new(r#"'([^']*)'\s*|\"([^\"]*)\"\s*|([^'\s]*)\s*"#).expect("Invalid Regex")
    })
}

/// Run a command line and return its stdout.
///
/// The command string is split on spaces, with quoted substrings preserved.
///
/// # Arguments
/// * `cmd` - The command string to execute
///
/// # Returns
/// * `Ok(String)` - The stdout output on success
/// * `Err` - If the command cannot start, exits non-zero or prints too much
pub async fn run(cmd: &str) -> Result<String> {
    log::debug!("run({cmd})", cmd = cmd.on_blue());

    let cmds: Vec<&str> = split_and_strip(cmd)
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect();
    log::trace!("split cmds={:?}", cmds);

    let (program, args) = cmds
        .split_first()
        .ok_or_else(|| Error::invalid_argument("Empty command line"))?;

    let output = Command::new(program).args(args).output().await.map_err(|e| {
        log::error!("Command execution failed: {}", e);
        Error::auth(format!("Failed to execute '{program}': {e}"))
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        log::trace!(
            "code={code:?}, status={status}\n┎######\nstderr=\n{stderr}\n┖######",
            code = output.status.code(),
            status = output.status,
            stderr = stderr.red()
        );
        log::warn!(
            "{failed} to run {cmd}",
            failed = "failed".on_red(),
            cmd = cmd.on_blue()
        );
        return Err(Error::auth(format!("'{program}' failed: {}", stderr.trim())));
    }

    log::debug!("Success cmd: {cmd} stdout.len()={}", output.stdout.len());
    if output.stdout.len() > MAX_OUTPUT_BYTES {
        return Err(Error::auth(format!(
            "Response too large: {} bytes for command: {:?}",
            output.stdout.len(),
            cmds
        )));
    }

    String::from_utf8(output.stdout)
        .map_err(|e| Error::serialization(format!("Invalid UTF-8 from '{program}': {e}")))
}

/// Split a command string on spaces, preserving quoted substrings.
fn split_and_strip(input: &str) -> Vec<&str> {
    get_command_regex()
        .find_iter(input)
        .map(|m| m.as_str().trim().trim_matches('\'').trim_matches('"'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_get_access_token() {
        let input = "az account get-access-token \
            --resource 'https://management.core.windows.net/' --output json";
        let parts: Vec<&str> = split_and_strip(input)
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect();
        assert_eq!(
            parts,
            vec![
                "az",
                "account",
                "get-access-token",
                "--resource",
                "https://management.core.windows.net/",
                "--output",
                "json"
            ]
        );
    }

    #[test]
    fn test_split_and_strip_empty_quotes() {
        let input = "Empty '' Single Quotes";
        let expected = vec!["Empty", "", "Single", "Quotes"];
        assert_eq!(&split_and_strip(input)[..4], &expected[..]);
    }

    #[test]
    fn test_split_double_quoted() {
        let input = "az account show --subscription \"Contoso Dev\"";
        assert!(split_and_strip(input).contains(&"Contoso Dev"));
    }

    #[tokio::test]
    async fn test_run_empty_command() {
        assert!(matches!(run("   ").await, Err(Error::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_run_missing_program() {
        let result = run("azsm-no-such-program-xyz --version").await;
        assert!(matches!(result, Err(Error::Auth(_))));
    }
}
