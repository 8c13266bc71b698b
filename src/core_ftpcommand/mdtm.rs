use crate::core_auth::Permission;
use crate::core_ftpcommand::reply::Reply;
use crate::core_ftpcommand::utils::{or_reply, required_arg, resolve_path, send_reply, ControlWriter};
use crate::server::ServerContext;
use crate::session::Session;
use chrono::{DateTime, NaiveDateTime, Utc};
use filetime::FileTime;
use log::{info, warn};

const MDTM_FORMAT: &str = "%Y%m%d%H%M%S";

/// Handles MDTM.
///
/// `MDTM path` reports the modification time in UTC. `MDTM YYYYMMDDHHMMSS
/// path` sets it, which needs the write permission.
pub async fn handle_mdtm_command(
    writer: &mut ControlWriter,
    ctx: &ServerContext,
    session: &mut Session,
    arg: &str,
) -> std::io::Result<()> {
    let arg = or_reply!(writer, required_arg(arg));
    let (timestamp, path) = split_timestamp(arg);

    let perm = if timestamp.is_some() {
        Permission::Write
    } else {
        Permission::List
    };
    let account = or_reply!(writer, session.require(perm));
    let resolved = or_reply!(writer, resolve_path(ctx, session, &account, path));

    let meta = match tokio::fs::metadata(&resolved.real).await {
        Ok(meta) if meta.is_file() => meta,
        _ => return send_reply(writer, &Reply::new(550, "No such file.")).await,
    };

    let reply = match timestamp {
        Some(ts) => match NaiveDateTime::parse_from_str(ts, MDTM_FORMAT) {
            Ok(datetime) => {
                let mtime = FileTime::from_unix_time(datetime.and_utc().timestamp(), 0);
                match filetime::set_file_mtime(&resolved.real, mtime) {
                    Ok(()) => {
                        info!("Set modification time of {} to {}", resolved.virtual_path, ts);
                        Reply::new(213, format!("Modify={}; {}", ts, resolved.virtual_path))
                    }
                    Err(e) => {
                        warn!("Failed to set mtime on {}: {}", resolved.virtual_path, e);
                        Reply::new(550, "Could not set modification time.")
                    }
                }
            }
            Err(_) => Reply::new(501, "Invalid time format."),
        },
        None => match meta.modified() {
            Ok(modified) => Reply::new(213, DateTime::<Utc>::from(modified).format(MDTM_FORMAT).to_string()),
            Err(_) => Reply::new(550, "Modification time not available."),
        },
    };
    send_reply(writer, &reply).await
}

/// Splits a leading 14-digit timestamp off the argument, if there is one.
fn split_timestamp(arg: &str) -> (Option<&str>, &str) {
    match arg.split_once(' ') {
        Some((first, rest))
            if first.len() == 14 && first.bytes().all(|b| b.is_ascii_digit()) =>
        {
            (Some(first), rest)
        }
        _ => (None, arg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_prefix_is_detected() {
        assert_eq!(
            split_timestamp("20240101120000 notes.txt"),
            (Some("20240101120000"), "notes.txt")
        );
        assert_eq!(split_timestamp("notes.txt"), (None, "notes.txt"));
        assert_eq!(split_timestamp("2024 notes.txt"), (None, "2024 notes.txt"));
    }
}
