//! Registration sequence run once per connection.

use tokio::time::sleep;
use tracing::{debug, info};

use super::{Connection, IDENTIFY_GRACE, JOIN_PAUSE};
use crate::error::ConnectionError;

/// PASS / NICK / USER, optional NickServ identify, a drain pass for early
/// PINGs, then one JOIN per configured channel.
pub(super) async fn register(conn: &mut Connection) -> Result<(), ConnectionError> {
    let config = std::sync::Arc::clone(&conn.config);
    let writer = conn.writer()?;

    if let Some(pass) = &config.serverpass {
        writer.write(&["PASS", pass.as_str()], None).await?;
    }
    writer.write(&["NICK", config.nick.as_str()], None).await?;
    writer
        .write(
            &["USER", config.user.as_str(), "+iw", config.nick.as_str()],
            Some(config.name.as_str()),
        )
        .await?;

    if let Some(pass) = config.nickpass.as_deref().filter(|p| !p.is_empty()) {
        writer.msg("NickServ", &format!("IDENTIFY {pass}")).await?;
        sleep(IDENTIFY_GRACE).await;
    }

    let mut drained = 0usize;
    let mut pending = conn.sequence(true)?;
    while pending.next().await.is_some() {
        drained += 1;
    }
    debug!(drained, "Drained early messages");

    for channel in &config.channels {
        match &channel.key {
            Some(key) => {
                writer
                    .write(&["JOIN", channel.name.as_str(), key.as_str()], None)
                    .await?
            }
            None => writer.write(&["JOIN", channel.name.as_str()], None).await?,
        }
        info!(channel = %channel.name, "Joining");
        sleep(JOIN_PAUSE).await;
    }

    info!(nick = %config.nick, "Registered");
    Ok(())
}
