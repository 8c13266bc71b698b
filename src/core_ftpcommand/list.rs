use crate::core_auth::Permission;
use crate::core_ftpcommand::reply::Reply;
use crate::core_ftpcommand::utils::{
    or_reply, resolve_path, run_transfer, send_reply, ControlWriter, TransferKind,
};
use crate::core_network::Payload;
use crate::server::ServerContext;
use crate::session::Session;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use std::fs::{self, Metadata};
use std::io::{self, Cursor};
use std::path::Path;

/// Entries older than this show the year instead of the time of day.
const RECENT_DAYS: i64 = 180;

/// Handles LIST, and NLST when `names_only` is set.
///
/// The listing is built up front so a missing directory gets a 550 before the
/// data channel is touched.
pub async fn handle_list_command(
    writer: &mut ControlWriter,
    ctx: &ServerContext,
    session: &mut Session,
    arg: &str,
    names_only: bool,
) -> std::io::Result<()> {
    let account = or_reply!(writer, session.require(Permission::List));
    let target = strip_list_options(arg);
    let resolved = or_reply!(writer, resolve_path(ctx, session, &account, target));

    let real = resolved.real.clone();
    let listing = match tokio::task::spawn_blocking(move || build_listing(&real, names_only)).await {
        Ok(Ok(listing)) => listing,
        Ok(Err(e)) => {
            warn!("Failed to list {}: {}", resolved.virtual_path, e);
            return send_reply(writer, &Reply::new(550, "No such file or directory.")).await;
        }
        Err(e) => {
            warn!("Listing task failed: {}", e);
            return send_reply(
                writer,
                &Reply::new(451, "Requested action aborted. Local error in processing."),
            )
            .await;
        }
    };
    debug!("Listing {} ({} bytes)", resolved.virtual_path, listing.len());

    let mut payload = Cursor::new(listing.into_bytes());
    let what = if names_only { "NLST" } else { "LIST" };
    run_transfer(
        writer,
        ctx,
        session,
        Payload::Outgoing(&mut payload),
        TransferKind::Download,
        what,
    )
    .await
}

/// Drops leading `ls`-style flags such as `-la`, which many clients send.
pub fn strip_list_options(arg: &str) -> &str {
    let mut rest = arg.trim_start();
    while rest.starts_with('-') {
        rest = match rest.split_once(' ') {
            Some((_, tail)) => tail.trim_start(),
            None => "",
        };
    }
    rest
}

fn build_listing(path: &Path, names_only: bool) -> io::Result<String> {
    let meta = fs::metadata(path)?;
    let now = Utc::now();
    let mut out = String::new();

    if !meta.is_dir() {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        push_entry(&mut out, &name, &meta, now, names_only);
        return Ok(out);
    }

    let mut entries: Vec<_> = fs::read_dir(path)?.filter_map(Result::ok).collect();
    entries.sort_by_key(|entry| entry.file_name());
    for entry in entries {
        let name = entry.file_name().to_string_lossy().into_owned();
        match entry.metadata() {
            Ok(meta) => push_entry(&mut out, &name, &meta, now, names_only),
            Err(e) => warn!("Skipping {} in listing: {}", name, e),
        }
    }
    Ok(out)
}

fn push_entry(out: &mut String, name: &str, meta: &Metadata, now: DateTime<Utc>, names_only: bool) {
    if names_only {
        out.push_str(name);
        out.push_str("\r\n");
    } else {
        out.push_str(&format_entry(name, meta, now));
    }
}

/// One `ls -l` style line, CRLF terminated.
pub fn format_entry(name: &str, meta: &Metadata, now: DateTime<Utc>) -> String {
    let modified = meta.modified().map(DateTime::<Utc>::from).unwrap_or(now);
    let date = if (now - modified).num_days().abs() < RECENT_DAYS {
        modified.format("%b %d %H:%M")
    } else {
        modified.format("%b %d  %Y")
    };
    let (nlink, owner, group) = ownership(meta);
    format!(
        "{} {:>3} {:<8} {:<8} {:>8} {} {}\r\n",
        mode_string(meta),
        nlink,
        owner,
        group,
        meta.len(),
        date,
        name
    )
}

#[cfg(unix)]
fn mode_string(meta: &Metadata) -> String {
    use std::os::unix::fs::PermissionsExt;

    let mode = meta.permissions().mode();
    let mut s = String::with_capacity(10);
    s.push(if meta.file_type().is_symlink() {
        'l'
    } else if meta.is_dir() {
        'd'
    } else {
        '-'
    });
    for shift in [6, 3, 0] {
        let bits = (mode >> shift) & 0o7;
        s.push(if bits & 0o4 != 0 { 'r' } else { '-' });
        s.push(if bits & 0o2 != 0 { 'w' } else { '-' });
        s.push(if bits & 0o1 != 0 { 'x' } else { '-' });
    }
    s
}

#[cfg(not(unix))]
fn mode_string(meta: &Metadata) -> String {
    if meta.is_dir() {
        "drwxr-xr-x".to_string()
    } else if meta.permissions().readonly() {
        "-r--r--r--".to_string()
    } else {
        "-rw-r--r--".to_string()
    }
}

#[cfg(unix)]
fn ownership(meta: &Metadata) -> (u64, String, String) {
    use std::os::unix::fs::MetadataExt;
    (meta.nlink(), meta.uid().to_string(), meta.gid().to_string())
}

#[cfg(not(unix))]
fn ownership(_meta: &Metadata) -> (u64, String, String) {
    (1, "owner".to_string(), "group".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn options_are_stripped() {
        assert_eq!(strip_list_options("-la"), "");
        assert_eq!(strip_list_options("-l -a docs"), "docs");
        assert_eq!(strip_list_options("my docs"), "my docs");
        assert_eq!(strip_list_options(""), "");
    }

    #[test]
    fn listing_is_sorted_and_crlf_terminated() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.txt"), b"12345").unwrap();
        fs::create_dir(dir.path().join("a")).unwrap();

        let listing = build_listing(dir.path(), false).unwrap();
        let lines: Vec<&str> = listing.split("\r\n").filter(|l| !l.is_empty()).collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with('d'));
        assert!(lines[0].ends_with(" a"));
        assert!(lines[1].starts_with('-'));
        assert!(lines[1].contains(" 5 "));
        assert!(lines[1].ends_with(" b.txt"));
    }

    #[test]
    fn name_listing_has_bare_names() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("one"), b"").unwrap();
        fs::write(dir.path().join("two"), b"").unwrap();
        assert_eq!(build_listing(dir.path(), true).unwrap(), "one\r\ntwo\r\n");
    }

    #[test]
    fn listing_a_file_lists_just_that_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("report.pdf");
        fs::write(&file, b"x").unwrap();
        assert_eq!(build_listing(&file, true).unwrap(), "report.pdf\r\n");
    }

    #[test]
    fn old_entries_show_the_year() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("old");
        fs::write(&file, b"").unwrap();
        filetime::set_file_mtime(&file, filetime::FileTime::from_unix_time(946_684_800, 0)).unwrap();
        let meta = fs::metadata(&file).unwrap();
        let line = format_entry("old", &meta, Utc::now());
        assert!(line.contains("Jan 01  2000"), "{}", line);
    }
}
