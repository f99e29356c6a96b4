mod process;
pub mod pty;
#[cfg(test)]
mod tests;

/// Handle for interacting with a spawned interactive process.
pub use process::ProcessHandle;
/// Bundle of process handle plus output and exit receivers returned by spawn.
pub use process::SpawnedProcess;
/// Spawn a process attached to a PTY for interactive use.
pub use pty::spawn_process as spawn_pty_process;
