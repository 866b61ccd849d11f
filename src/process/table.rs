//! Process table scan
//!
//! Liveness probes shell out to `ps aux` and match on the executable name,
//! the same check `pgrep -x` performs. A probe that cannot enumerate the
//! table reports the process as absent.

use tokio::process::Command;

/// True when an executable named exactly `name` appears in the process table.
pub async fn is_listed(name: &str) -> bool {
    let output = match Command::new("ps").args(["aux"]).output().await {
        Ok(o) => o,
        Err(_) => return false,
    };

    let stdout = String::from_utf8_lossy(&output.stdout);
    stdout.lines().any(|line| line_names_executable(line, name))
}

/// Match a `ps aux` line against an executable name.
///
/// The command starts at the 11th column. Only the basename of the first
/// command token is compared, so `xrdp` does not match `xrdp-sesman` and
/// `/usr/sbin/xrdp --nodaemon` still matches.
fn line_names_executable(line: &str, name: &str) -> bool {
    let command = match line.split_whitespace().nth(10) {
        Some(c) => c,
        None => return false,
    };

    let executable = command.rsplit('/').next().unwrap_or(command);
    executable == name
}

#[cfg(test)]
mod tests {
    use super::*;

    const XRDP_LINE: &str =
        "root       612  0.0  0.1  20816  3120 ?        Ss   10:01   0:00 /usr/sbin/xrdp --nodaemon";
    const SESMAN_LINE: &str =
        "root       598  0.0  0.2  23456  5120 ?        Ss   10:01   0:00 xrdp-sesman";

    #[test]
    fn matches_absolute_path_with_arguments() {
        assert!(line_names_executable(XRDP_LINE, "xrdp"));
    }

    #[test]
    fn matches_bare_executable() {
        assert!(line_names_executable(SESMAN_LINE, "xrdp-sesman"));
    }

    #[test]
    fn prefix_does_not_match_longer_name() {
        assert!(!line_names_executable(SESMAN_LINE, "xrdp"));
    }

    #[test]
    fn header_and_short_lines_do_not_match() {
        let header = "USER       PID %CPU %MEM    VSZ   RSS TTY      STAT START   TIME COMMAND";
        assert!(!line_names_executable(header, "xrdp"));
        assert!(!line_names_executable("", "xrdp"));
        assert!(!line_names_executable("root 612", "xrdp"));
    }

    #[test]
    fn name_inside_arguments_does_not_match() {
        let grep_line =
            "root       811  0.0  0.0   6332  2040 pts/0    S+   10:05   0:00 grep --color=auto xrdp";
        assert!(!line_names_executable(grep_line, "xrdp"));
    }
}
