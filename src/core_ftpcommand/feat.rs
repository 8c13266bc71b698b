use crate::core_ftpcommand::reply::Reply;
use crate::core_ftpcommand::utils::{send_reply, ControlWriter};

/// Extensions advertised by FEAT, one per line.
pub const FEATURES: [&str; 4] = ["EPRT", "EPSV", "MDTM", "SIZE"];

pub async fn handle_feat_command(writer: &mut ControlWriter) -> std::io::Result<()> {
    let lines = std::iter::once("Features:".to_string())
        .chain(FEATURES.iter().map(|feature| format!(" {}", feature)))
        .chain(std::iter::once("End".to_string()));
    send_reply(writer, &Reply::multiline(211, lines)).await
}
