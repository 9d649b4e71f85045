//! `aerostat reload-boundary`: signals the already-running instance (found
//! via the instance lock file's recorded PID) to re-read its boundary
//! polygon, without restarting the process (§10.1, §6).

use anyhow::Context;

use crate::instance_lock::InstanceLock;

pub async fn handle_reload_boundary() -> anyhow::Result<()> {
    let lock_path = InstanceLock::lock_path_for("aerostat").context("locating instance lock file")?;
    let contents = std::fs::read_to_string(&lock_path)
        .with_context(|| format!("reading instance lock file {}", lock_path.display()))?;
    let pid: i32 = contents
        .trim()
        .parse()
        .with_context(|| format!("parsing PID from instance lock file {}", lock_path.display()))?;

    send_sighup(pid)?;
    println!("sent SIGHUP to pid {pid}");
    Ok(())
}

#[cfg(unix)]
fn send_sighup(pid: i32) -> anyhow::Result<()> {
    let result = unsafe { libc::kill(pid, libc::SIGHUP) };
    if result != 0 {
        return Err(std::io::Error::last_os_error()).context("sending SIGHUP");
    }
    Ok(())
}

#[cfg(not(unix))]
fn send_sighup(_pid: i32) -> anyhow::Result<()> {
    anyhow::bail!("reload-boundary is only supported on Unix targets")
}
