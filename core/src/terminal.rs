use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio::sync::mpsc;
use tracing::debug;

use autoquest_pty::ProcessHandle;
use autoquest_pty::spawn_pty_process;

use crate::ansi;
use crate::config::GameConfig;
use crate::error::PlayerErr;
use crate::error::Result;
use crate::screen_diff;

/// The game as the session sees it: read a stable screen, type a command and
/// read what it produced, shut down.
#[async_trait]
pub trait GameIo: Send {
    async fn current_screen(&mut self) -> Result<String>;

    /// Sends `command` followed by Enter (just Enter when empty) and returns
    /// the text the game printed strictly after the command went in, with
    /// the command's own echo removed.
    async fn send_command(&mut self, command: &str) -> Result<String>;

    async fn close(&mut self);
}

/// Runs the game under a PTY and accumulates everything it writes. The
/// cleaned form of that transcript is the "screen"; diffing two snapshots of
/// it yields the per-turn new text.
pub struct TerminalGame {
    handle: ProcessHandle,
    output_rx: broadcast::Receiver<Vec<u8>>,
    writer_tx: mpsc::Sender<Vec<u8>>,
    raw: String,
    config: GameConfig,
}

impl TerminalGame {
    pub async fn spawn(config: &GameConfig) -> Result<Self> {
        let (program, args) = config
            .command
            .split_first()
            .ok_or_else(|| PlayerErr::Config("game command is empty".to_string()))?;
        let env: HashMap<String, String> = std::env::vars().collect();
        let spawned = spawn_pty_process(
            program,
            args,
            &config.cwd,
            &env,
            config.rows,
            config.cols,
        )
        .await?;

        Ok(Self {
            writer_tx: spawned.session.writer_sender(),
            output_rx: spawned.output_rx,
            handle: spawned.session,
            raw: String::new(),
            config: config.clone(),
        })
    }

    fn drain_output(&mut self) {
        loop {
            match self.output_rx.try_recv() {
                Ok(chunk) => self.raw.push_str(&String::from_utf8_lossy(&chunk)),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    debug!("pty output receiver lagged, skipped {skipped} chunks");
                }
                Err(broadcast::error::TryRecvError::Empty)
                | Err(broadcast::error::TryRecvError::Closed) => break,
            }
        }
    }

    fn cleaned_screen(&self) -> String {
        ansi::clean_screen_text(&self.raw).trim_end().to_string()
    }

    /// Polls the cleaned transcript until it stops changing across one
    /// interval, or the hard timeout elapses. Returns the stable text.
    async fn stabilize(&mut self) -> String {
        let deadline = tokio::time::Instant::now() + self.config.stabilize_timeout;
        self.drain_output();
        let mut prev = self.cleaned_screen();
        while tokio::time::Instant::now() < deadline {
            tokio::time::sleep(self.config.poll_interval).await;
            self.drain_output();
            let current = self.cleaned_screen();
            if current == prev {
                return current;
            }
            prev = current;
        }
        prev
    }
}

#[async_trait]
impl GameIo for TerminalGame {
    async fn current_screen(&mut self) -> Result<String> {
        Ok(self.stabilize().await)
    }

    async fn send_command(&mut self, command: &str) -> Result<String> {
        if self.handle.has_exited() {
            return Err(PlayerErr::GameExited {
                exit_code: self.handle.exit_code(),
            });
        }

        self.drain_output();
        let baseline = self.cleaned_screen();

        let mut bytes = Vec::with_capacity(command.len() + 2);
        bytes.extend_from_slice(command.as_bytes());
        bytes.extend_from_slice(b"\r\n");
        if self.writer_tx.send(bytes).await.is_err() {
            return Err(PlayerErr::GameExited {
                exit_code: self.handle.exit_code(),
            });
        }

        let stable = self.stabilize().await;
        let fresh = screen_diff::new_text(&baseline, &stable);
        Ok(trim_echo(fresh, command, self.config.prompt_marker.as_deref()).to_string())
    }

    async fn close(&mut self) {
        self.handle.terminate();
    }
}

/// Cuts the echoed input out of newly produced text. The PTY reflects what
/// was typed, so the text after the last occurrence of the command is what
/// the game actually said; when the echo cannot be found (or the command was
/// just Enter), the configured prompt marker anchors the cut instead.
fn trim_echo<'a>(text: &'a str, command: &str, prompt_marker: Option<&str>) -> &'a str {
    if !command.is_empty()
        && let Some(idx) = text.rfind(command)
    {
        return text[idx + command.len()..].trim_start();
    }
    if let Some(marker) = prompt_marker
        && !marker.is_empty()
        && let Some(idx) = text.rfind(marker)
    {
        return text[idx + marker.len()..].trim_start();
    }
    text
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn echo_is_cut_at_the_last_command_occurrence() {
        let text = "What do you do?: go north\nYou walk north.\n";
        assert_eq!(trim_echo(text, "go north", None), "You walk north.");
    }

    #[test]
    fn prompt_marker_anchors_when_the_echo_is_missing() {
        let text = "Press a key...\nWhat do you do?: \nA troll appears.";
        assert_eq!(
            trim_echo(text, "", Some("What do you do?:")),
            "A troll appears."
        );
    }

    #[test]
    fn text_passes_through_when_nothing_matches() {
        let text = "A door creaks open.";
        assert_eq!(trim_echo(text, "pull lever", None), text);
        assert_eq!(trim_echo(text, "", None), text);
    }

    #[test]
    fn repeated_echo_lines_cut_at_the_latest_one() {
        let text = "look\nYou see a room.\nlook\nYou see the same room.";
        assert_eq!(trim_echo(text, "look", None), "You see the same room.");
    }

    #[cfg(unix)]
    mod pty {
        use std::path::PathBuf;
        use std::time::Duration;

        use super::*;

        fn fast_config(script: &str) -> GameConfig {
            GameConfig {
                command: vec![
                    "/bin/sh".to_string(),
                    "-c".to_string(),
                    script.to_string(),
                ],
                cwd: PathBuf::from("."),
                rows: 24,
                cols: 80,
                prompt_marker: None,
                stabilize_timeout: Duration::from_secs(10),
                poll_interval: Duration::from_millis(50),
            }
        }

        #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
        async fn reads_initial_screen_and_command_output() -> Result<()> {
            let config = fast_config("echo ready; while read line; do echo saw:$line; done");
            let mut game = TerminalGame::spawn(&config).await?;

            let screen = game.current_screen().await?;
            assert!(screen.contains("ready"), "unexpected screen: {screen:?}");

            let fresh = game.send_command("hello").await?;
            assert!(fresh.contains("saw:hello"), "unexpected output: {fresh:?}");

            game.close().await;
            Ok(())
        }

        #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
        async fn sending_to_an_exited_game_fails() -> Result<()> {
            let config = fast_config("true");
            let mut game = TerminalGame::spawn(&config).await?;

            // Give the child time to exit.
            let _ = game.current_screen().await?;
            tokio::time::sleep(Duration::from_millis(200)).await;
            game.drain_output();

            let err = loop {
                match game.send_command("hello").await {
                    Err(err) => break err,
                    Ok(_) => tokio::time::sleep(Duration::from_millis(100)).await,
                }
            };
            assert!(matches!(err, PlayerErr::GameExited { .. }));

            game.close().await;
            Ok(())
        }
    }
}
