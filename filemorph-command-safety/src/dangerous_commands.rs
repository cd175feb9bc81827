//! Static table of executables that are never run by the conversion engine.
//!
//! Conversion templates have no business deleting files, escalating
//! privileges, or talking to the network; any template that expands to one
//! of these executables is blocked before it reaches an interpreter.
//! Lookups are by basename; callers strip path prefixes first.

/// Category label for a dangerous executable basename, or `None` when the
/// basename is not in the table.
pub fn dangerous_command_category(basename: &str) -> Option<&'static str> {
    let category = match basename {
        // Privilege escalation
        "sudo" | "su" | "pkexec" | "doas" => "privilege escalation",

        // File deletion / destruction
        "rm" | "unlink" => "file deletion",
        "rmdir" => "directory deletion",
        "shred" => "file destruction",
        "truncate" => "file truncation",

        // Disk / partition operations
        "dd" => "raw disk operation",
        "mkfs" => "filesystem creation",
        "fdisk" | "parted" => "disk partitioning",
        "wipefs" => "filesystem signature removal",
        "blkdiscard" => "block device discard",

        // System control
        "shutdown" => "system shutdown",
        "reboot" => "system reboot",
        "poweroff" => "system power off",
        "halt" => "system halt",
        "init" => "system init control",
        "systemctl" => "system service control",

        // Network exfiltration
        "curl" => "network access",
        "wget" => "network download",
        "nc" | "ncat" | "netcat" => "network connection",
        "ssh" => "remote shell access",
        "scp" => "remote file copy",
        "rsync" => "remote file sync",
        "ftp" => "file transfer",

        // Permission / ownership changes
        "chmod" => "permission change",
        "chown" => "ownership change",
        "chgrp" => "group ownership change",

        // Shell code execution primitives
        "eval" | "exec" => "shell code execution",

        _ => return None,
    };
    Some(category)
}

/// True when the basename is in the dangerous-command table.
pub fn is_dangerous(basename: &str) -> bool {
    dangerous_command_category(basename).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_tools_are_not_in_the_table() {
        for tool in ["ffmpeg", "convert", "magick", "7z", "tar", "pandoc", "soffice"] {
            assert!(!is_dangerous(tool), "{tool} should not be dangerous");
        }
    }

    #[test]
    fn rm_is_file_deletion() {
        assert_eq!(dangerous_command_category("rm"), Some("file deletion"));
    }

    #[test]
    fn sudo_is_privilege_escalation() {
        assert_eq!(
            dangerous_command_category("sudo"),
            Some("privilege escalation")
        );
    }

    #[test]
    fn lookup_is_exact_basename() {
        // `mkfs.ext4` is a different basename than `mkfs` and is not listed.
        assert!(is_dangerous("mkfs"));
        assert!(!is_dangerous("mkfs.ext4"));
    }
}
