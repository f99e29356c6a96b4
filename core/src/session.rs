use tokio::sync::mpsc;
use tracing::debug;
use tracing::warn;

use crate::client::ModelClient;
use crate::config::Config;
use crate::error::Result;
use crate::history;
use crate::history::ConversationHistory;
use crate::history::TurnResult;
use crate::memory::MemoryStore;
use crate::terminal::GameIo;
use crate::transcript::SummaryTranscript;

/// Fed to the model as the next game text when a turn produced no command,
/// so the conversation still advances.
pub const IDLE_TURN_SENTINEL: &str = "<meta>No new text from the game this turn.</meta>";

/// Read-only hand-offs published to the frontend, one per observable step.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// New game text, about to be shown to the model.
    ScreenText(String),
    /// One model exchange finished.
    TurnCompleted {
        result: TurnResult,
        memory: Vec<(String, String)>,
        /// Plays left before the next summarization cut.
        turns_until_summary: u32,
    },
    /// A command is being typed into the game.
    CommandDispatched { command: String },
    SummarizeBegin,
    SummarizeEnd { replaced: bool },
}

/// Owns everything a run needs: the conversation, the memory map, the model
/// client, and the summary transcript. One session plays one game.
pub struct Session {
    config: Config,
    client: ModelClient,
    history: ConversationHistory,
    memory: MemoryStore,
    transcript: SummaryTranscript,
    plays_since_summary: u32,
}

impl Session {
    pub fn new(config: Config) -> Result<Self> {
        let transcript = SummaryTranscript::create(&config.summary_log)?;
        let client = ModelClient::new(&config);
        let history = ConversationHistory::new(&config.system_prompt);
        Ok(Self {
            config,
            client,
            history,
            memory: MemoryStore::new(),
            transcript,
            plays_since_summary: 0,
        })
    }

    /// Drives the play loop until the event receiver goes away or a
    /// non-retryable error surfaces. The game is closed on the way out.
    pub async fn run(
        mut self,
        mut game: impl GameIo,
        events: mpsc::Sender<SessionEvent>,
    ) -> Result<()> {
        let outcome = self.play_loop(&mut game, &events).await;
        game.close().await;
        outcome
    }

    async fn play_loop(
        &mut self,
        game: &mut impl GameIo,
        events: &mpsc::Sender<SessionEvent>,
    ) -> Result<()> {
        let mut game_text = game.current_screen().await?;
        if events
            .send(SessionEvent::ScreenText(game_text.clone()))
            .await
            .is_err()
        {
            return Ok(());
        }

        loop {
            // A summarization cycle replaces the conversation but consumes no
            // play turn; the pending game text carries over to the next turn.
            if self.plays_since_summary >= self.config.summarize_after {
                if events.send(SessionEvent::SummarizeBegin).await.is_err() {
                    return Ok(());
                }
                let replaced = self.summarize(&game_text).await?;
                self.plays_since_summary = 0;
                if events
                    .send(SessionEvent::SummarizeEnd { replaced })
                    .await
                    .is_err()
                {
                    return Ok(());
                }
                continue;
            }

            let result = self.take_turn(&game_text).await?;
            let turns_until_summary = self.config.summarize_after - self.plays_since_summary;
            if events
                .send(SessionEvent::TurnCompleted {
                    result: result.clone(),
                    memory: self.memory.entries(),
                    turns_until_summary,
                })
                .await
                .is_err()
            {
                return Ok(());
            }

            match result.command {
                Some(command) => {
                    if events
                        .send(SessionEvent::CommandDispatched {
                            command: command.clone(),
                        })
                        .await
                        .is_err()
                    {
                        return Ok(());
                    }
                    game_text = game.send_command(&command).await?;
                    self.plays_since_summary += 1;
                    if events
                        .send(SessionEvent::ScreenText(game_text.clone()))
                        .await
                        .is_err()
                    {
                        return Ok(());
                    }
                }
                None => {
                    debug!("no command this turn; feeding the idle sentinel");
                    game_text = IDLE_TURN_SENTINEL.to_string();
                }
            }
        }
    }

    async fn take_turn(&mut self, game_text: &str) -> Result<TurnResult> {
        let input = self.history.prepare_request_view(&self.memory, game_text);
        let response = self.client.play_request(input).await?;
        debug!(items = response.output.len(), "model responded");
        Ok(self
            .history
            .ingest_model_output(response.output, &mut self.memory, response.usage))
    }

    /// Compresses the whole conversation into a short narrative and replaces
    /// it with a two-entry seed (system prompt + summary). The memory map is
    /// deliberately left untouched by the cut. Returns whether a cut
    /// happened.
    async fn summarize(&mut self, game_text: &str) -> Result<bool> {
        self.history.remove_memory_entries();
        let mut input = self.history.contents();
        if !game_text.is_empty() {
            input.push(history::user_message(game_text));
        }
        input.push(history::memory_note(&self.memory));
        input.push(history::user_message(&self.config.summary_prompt));

        // Never abandon a summarization attempt: without the cut the
        // conversation would only keep growing.
        let response = loop {
            match self.client.summary_request(&input).await {
                Ok(response) => break response,
                Err(err) => {
                    warn!("summary request failed, retrying: {err}");
                    tokio::time::sleep(self.config.summary_retry_delay).await;
                }
            }
        };

        let summary = response.output_text();
        if summary.is_empty() {
            debug!("summary response had no text; keeping the current history");
            return Ok(false);
        }

        self.transcript.append(&summary)?;
        self.history.reset(vec![
            history::system_message(&self.config.system_prompt),
            history::user_message(&summary),
        ]);
        Ok(true)
    }
}
