use log::warn;
use std::fmt::Write as _;
use std::io::{Cursor, Read};
use zip::ZipArchive;

use crate::error::{CiScopeError, Result};
use crate::logging::LogScope;

const TEXT_EXTENSION: &str = ".txt";

/// Concatenates every `.txt` member of a run's log archive.
///
/// Members are visited in sorted name order and each is preceded by a
/// `=== <member> ===` header line. Bytes that aren't valid UTF-8 are replaced.
/// A corrupt archive yields an empty string; an unreadable member is skipped.
pub fn extract_logs(bytes: &[u8], scope: &LogScope) -> String {
    let scope = scope.for_target("ciscope::archive");

    let mut archive = match ZipArchive::new(Cursor::new(bytes)) {
        Ok(archive) => archive,
        Err(e) => {
            warn!(target: scope.target(), "{scope} unreadable log archive: {e}");
            return String::new();
        }
    };

    let mut names: Vec<String> = archive
        .file_names()
        .filter(|name| name.ends_with(TEXT_EXTENSION))
        .map(str::to_string)
        .collect();
    names.sort();

    let mut text = String::new();
    for name in &names {
        match read_member(&mut archive, name) {
            Ok(content) => {
                let _ = writeln!(text, "=== {name} ===");
                text.push_str(&String::from_utf8_lossy(&content));
                if !text.ends_with('\n') {
                    text.push('\n');
                }
            }
            Err(e) => {
                warn!(target: scope.target(), "{scope} member={name} skipped: {e}");
            }
        }
    }

    text
}

fn read_member(archive: &mut ZipArchive<Cursor<&[u8]>>, name: &str) -> Result<Vec<u8>> {
    let mut member = archive
        .by_name(name)
        .map_err(|e| CiScopeError::Archive(e.to_string()))?;
    let mut content = Vec::new();
    member.read_to_end(&mut content)?;
    Ok(content)
}
