//! Default storage locations
//!
//! Computes the home directory and the application data directory from an
//! [`EnvSnapshot`]. Both resolvers are total: whatever the environment looks
//! like they return a non-empty path, falling back to `"."` (the current
//! directory) when nothing better is known.
//!
//! # Resolution order
//!
//! | Step | Home directory                                   | Data directory                          |
//! |------|--------------------------------------------------|-----------------------------------------|
//! | 1    | `HOME`                                           | `<home>/.local/share`                   |
//! | 2    | Windows: `HOMEDRIVE` + `HOMEPATH`, else `USERPROFILE` | `XDG_DATA_HOME` replaces step 1 if set |
//! | 3    | `"."`                                            | append `caddy`                          |
//!
//! See the XDG Base Directory Specification for the meaning of
//! `XDG_DATA_HOME`.

use crate::environment::{EnvSnapshot, HOME, HOMEDRIVE, HOMEPATH, USERPROFILE, XDG_DATA_HOME};
use crate::types::Platform;

/// Name of the application subdirectory inside the data directory
pub const APP_DIR_NAME: &str = "caddy";

/// Best guess of the current user's home directory.
///
/// Returns `"."` when the environment does not say.
pub fn home_dir(env: &EnvSnapshot) -> String {
    let mut home = env.get(HOME).to_string();

    if home.is_empty() && env.platform().is_windows() {
        let drive = env.get(HOMEDRIVE);
        let path = env.get(HOMEPATH);
        home = if drive.is_empty() || path.is_empty() {
            env.get(USERPROFILE).to_string()
        } else {
            format!("{drive}{path}")
        };
    }

    if home.is_empty() {
        home = ".".to_string();
    }
    home
}

/// Directory suitable for persistent application data.
pub fn data_dir(env: &EnvSnapshot) -> String {
    let platform = env.platform();

    let mut base_dir = join(platform, &[&home_dir(env), ".local", "share"]);
    let xdg_data = env.get(XDG_DATA_HOME);
    if !xdg_data.is_empty() {
        base_dir = xdg_data.to_string();
    }

    join(platform, &[&base_dir, APP_DIR_NAME])
}

/// [`home_dir`] for the running process
pub fn home_dir_from_process() -> String {
    home_dir(&EnvSnapshot::capture())
}

/// [`data_dir`] for the running process
pub fn data_dir_from_process() -> String {
    data_dir(&EnvSnapshot::capture())
}

/// Join path elements with the platform separator and clean the result.
///
/// Empty elements are ignored. Joining only empty elements yields `""`.
pub fn join(platform: Platform, elems: &[&str]) -> String {
    let sep = platform.separator().to_string();
    let joined = elems
        .iter()
        .filter(|e| !e.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(&sep);

    if joined.is_empty() {
        return joined;
    }
    clean(platform, &joined)
}

/// Lexically simplify a path.
///
/// Repeated separators collapse, `.` segments vanish and `..` removes the
/// preceding segment where one exists. A rooted path never climbs above its
/// root; an empty result becomes `"."`. On Windows a leading drive letter or
/// UNC share is kept as the volume and separators are normalised to `\`.
pub fn clean(platform: Platform, path: &str) -> String {
    let sep = platform.separator();
    let (volume, rest) = split_volume(platform, path);
    let rooted = rest.starts_with(|c: char| platform.is_separator(c));

    let mut parts: Vec<&str> = Vec::new();
    for segment in rest.split(|c: char| platform.is_separator(c)) {
        match segment {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|last| *last != "..") {
                    parts.pop();
                } else if !rooted {
                    parts.push("..");
                }
            }
            other => parts.push(other),
        }
    }

    let mut out = volume.replace('/', &sep.to_string());
    if rooted {
        out.push(sep);
    }
    out.push_str(&parts.join(&sep.to_string()));
    if parts.is_empty() && !rooted {
        out.push('.');
    }
    out
}

/// Split a Windows volume (`C:` or `\\server\share`) off the front of `path`.
fn split_volume(platform: Platform, path: &str) -> (&str, &str) {
    if !platform.is_windows() {
        return ("", path);
    }

    let bytes = path.as_bytes();
    if bytes.len() >= 2 && bytes[1] == b':' && bytes[0].is_ascii_alphabetic() {
        return path.split_at(2);
    }

    // UNC: two separators, a server name, a separator, a share name
    let is_sep = |b: u8| b == b'/' || b == b'\\';
    if bytes.len() >= 3 && is_sep(bytes[0]) && is_sep(bytes[1]) && !is_sep(bytes[2]) {
        if let Some(server_end) = bytes[2..].iter().position(|&b| is_sep(b)).map(|i| i + 2) {
            let share_start = server_end + 1;
            let share_end = bytes[share_start..]
                .iter()
                .position(|&b| is_sep(b))
                .map(|i| i + share_start)
                .unwrap_or(bytes.len());
            if share_end > share_start {
                return path.split_at(share_end);
            }
        }
    }

    ("", path)
}
