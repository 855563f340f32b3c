//! Command handling: routes UI commands to the learning components.
//!
//! All exercise, dashboard and chat state is owned here and mutated only
//! from the main loop. Network work (chat replies, speech) runs in spawned
//! tasks; chat replies come back through [`ChatReply`] messages and speech
//! reports its own start/end events.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::audio::guard::SpeechState;
use crate::chat::{RoleplayModel, RoleplaySession};
use crate::content::{alphabet_card, level_content, Dashboard, EbookReader, HIRAGANA, KATAKANA};
use crate::exercise::{ExerciseSet, SentenceExercise};
use crate::ipc::{AppCommand, AppEvent};
use crate::tts::{SpeechPipeline, VoiceProfile};

/// Level used when a command names none and nothing is selected.
const DEFAULT_LEVEL: &str = "N4";

/// A finished roleplay request, delivered back to the main loop.
#[derive(Debug)]
pub struct ChatReply {
    pub generation: u64,
    pub result: anyhow::Result<String>,
}

pub struct App {
    dashboard: Dashboard,
    exercise: Option<(String, ExerciseSet)>,
    ebook: Option<(String, EbookReader)>,
    roleplay: Option<(String, RoleplaySession)>,
    seed: Option<u64>,
    speech: Option<SpeechPipeline>,
    chat_model: Option<Arc<dyn RoleplayModel>>,
    events: mpsc::UnboundedSender<AppEvent>,
    replies: mpsc::UnboundedSender<ChatReply>,
}

impl App {
    /// Returns the app and the receiving end for chat replies.
    pub fn new(
        seed: Option<u64>,
        speech: Option<SpeechPipeline>,
        chat_model: Option<Arc<dyn RoleplayModel>>,
        events: mpsc::UnboundedSender<AppEvent>,
    ) -> (Self, mpsc::UnboundedReceiver<ChatReply>) {
        let (replies, replies_rx) = mpsc::unbounded_channel();
        let app = Self {
            dashboard: Dashboard::default(),
            exercise: None,
            ebook: None,
            roleplay: None,
            seed,
            speech,
            chat_model,
            events,
            replies,
        };
        (app, replies_rx)
    }

    fn emit(&self, event: AppEvent) {
        // Receiver gone means we are shutting down.
        let _ = self.events.send(event);
    }

    fn emit_error(&self, message: impl Into<String>) {
        self.emit(AppEvent::Error {
            message: message.into(),
        });
    }

    /// Explicit id, else the selected level, else N4.
    fn resolve_level(&self, level_id: Option<String>) -> String {
        level_id
            .filter(|id| !id.trim().is_empty())
            .or_else(|| self.dashboard.selected().map(|l| l.id.clone()))
            .unwrap_or_else(|| DEFAULT_LEVEL.to_string())
    }

    fn level_name(&self, level_id: &str) -> String {
        self.dashboard
            .levels()
            .iter()
            .find(|l| l.id == level_id)
            .map(|l| l.name.clone())
            .unwrap_or_else(|| level_id.to_string())
    }

    /// Handle a single command from the UI.
    /// Returns `false` if the main loop should exit.
    pub fn handle_command(&mut self, cmd: AppCommand) -> bool {
        match cmd {
            AppCommand::Ping {} => self.emit(AppEvent::Pong {}),

            AppCommand::Stop {} => {
                self.emit(AppEvent::Stopping {});
                return false;
            }

            AppCommand::ListLevels {} => self.emit(AppEvent::Levels {
                alphabet: alphabet_card(),
                levels: self.dashboard.levels().to_vec(),
            }),

            AppCommand::SelectLevel { level_id } => self.select_level(&level_id),

            AppCommand::UnlockNextLevel {} => match self.dashboard.unlock_next() {
                Some(level) => {
                    let level = level.clone();
                    self.emit(AppEvent::LevelUnlocked { level });
                }
                None => debug!("unlock_next_level: nothing to unlock"),
            },

            AppCommand::GetContent { level_id } => {
                let level_id = self.resolve_level(level_id);
                let content = level_content(&level_id);
                self.emit(AppEvent::Content { level_id, content });
            }

            AppCommand::GetAlphabet {} => self.emit_alphabet(),

            AppCommand::LoadExercise { level_id, index } => {
                let level_id = self.resolve_level(level_id);
                self.load_exercise(level_id, index);
            }

            AppCommand::PlaceFromPool { position } => {
                self.with_exercise(|ex| {
                    ex.place_from_pool(position);
                });
            }

            AppCommand::ReturnToPool { position } => {
                self.with_exercise(|ex| {
                    ex.return_to_pool(position);
                });
            }

            AppCommand::CheckExercise {} => {
                if let Some(verdict) = self.with_exercise(SentenceExercise::check) {
                    self.emit(AppEvent::Verdict {
                        verdict,
                        message: verdict.message().to_string(),
                    });
                }
            }

            AppCommand::Hint {} => {
                self.with_exercise(|ex| {
                    ex.hint();
                });
            }

            AppCommand::ResetExercise {} => self.with_set(ExerciseSet::reset),

            AppCommand::NextExercise {} => self.with_set(ExerciseSet::advance),

            AppCommand::ListChapters { level_id } => {
                let level_id = self.resolve_level(level_id);
                self.list_chapters(level_id);
            }

            AppCommand::SelectChapter { index } => self.select_chapter(index),

            AppCommand::SpeakChapterItem { index } => self.speak_chapter_item(index),

            AppCommand::StartScenario { scenario } => self.start_scenario(scenario),

            AppCommand::SendChat { text } => self.send_chat(&text),

            AppCommand::SpeakContent { text } => self.speak(&text, VoiceProfile::Content),

            AppCommand::SpeakGuidance { text } => self.speak(&text, VoiceProfile::Guidance),

            AppCommand::GetSpeechStatus {} => self.emit_speech_status(),
        }

        true
    }

    // -- dashboard ----------------------------------------------------------

    fn select_level(&mut self, level_id: &str) {
        if level_id == alphabet_card().id {
            self.emit_alphabet();
            return;
        }
        match self.dashboard.select(level_id) {
            Some(level) => {
                let level = level.clone();
                info!(level = %level.id, "Level selected");
                self.emit(AppEvent::LevelSelected { level });
            }
            None => self.emit_error(format!("Level {} is locked or unknown", level_id)),
        }
    }

    fn emit_alphabet(&self) {
        self.emit(AppEvent::Alphabet {
            hiragana: HIRAGANA.iter().map(|s| s.to_string()).collect(),
            katakana: KATAKANA.iter().map(|s| s.to_string()).collect(),
        });
    }

    // -- sentence exercise --------------------------------------------------

    fn load_exercise(&mut self, level_id: String, index: usize) {
        let reuse = matches!(&self.exercise, Some((id, _)) if *id == level_id);
        if !reuse {
            let set = ExerciseSet::with_seed(level_content(&level_id).sentences, self.seed);
            self.exercise = Some((level_id.clone(), set));
            if index == 0 {
                self.emit_exercise();
                return;
            }
        }
        if let Some((_, set)) = self.exercise.as_mut() {
            set.load(index);
        }
        self.emit_exercise();
    }

    fn emit_exercise(&self) {
        let Some((level_id, set)) = &self.exercise else {
            return;
        };
        if !set.is_available() {
            debug!(level = %level_id, "No sentences for this level");
        }
        match set.snapshot() {
            Some(snapshot) => self.emit(AppEvent::Exercise {
                level_id: level_id.clone(),
                snapshot,
            }),
            None => self.emit(AppEvent::ExerciseUnavailable {
                level_id: level_id.clone(),
            }),
        }
    }

    /// Apply `f` to the current exercise and re-emit its state.
    fn with_exercise<T>(&mut self, f: impl FnOnce(&mut SentenceExercise) -> T) -> Option<T> {
        let Some(ex) = self.exercise.as_mut().and_then(|(_, set)| set.current_mut()) else {
            warn!("Exercise command ignored: no exercise loaded");
            self.emit_error("No exercise loaded");
            return None;
        };
        let out = f(ex);
        self.emit_exercise();
        Some(out)
    }

    fn with_set(&mut self, f: impl FnOnce(&mut ExerciseSet) -> bool) {
        let Some((_, set)) = self.exercise.as_mut() else {
            warn!("Exercise command ignored: no exercise loaded");
            self.emit_error("No exercise loaded");
            return;
        };
        f(set);
        self.emit_exercise();
    }

    // -- e-book -------------------------------------------------------------

    fn list_chapters(&mut self, level_id: String) {
        let reader = EbookReader::for_level(&level_id);
        if !reader.is_available() {
            debug!(level = %level_id, "No e-book chapters for this level");
        }
        self.emit(AppEvent::Chapters {
            level_id: level_id.clone(),
            titles: reader.titles().iter().map(|t| t.to_string()).collect(),
            selected: reader.selected_index(),
        });
        if let Some(chapter) = reader.current() {
            self.emit(AppEvent::Chapter {
                index: reader.selected_index(),
                chapter: chapter.clone(),
            });
        }
        self.ebook = Some((level_id, reader));
    }

    fn select_chapter(&mut self, index: usize) {
        let chapter = self
            .ebook
            .as_mut()
            .and_then(|(_, reader)| reader.select_chapter(index))
            .cloned();
        match chapter {
            Some(chapter) => self.emit(AppEvent::Chapter { index, chapter }),
            None => self.emit_error(format!("Chapter {} is not available", index)),
        }
    }

    /// Read an example line of the open chapter aloud.
    fn speak_chapter_item(&self, index: usize) {
        let item = self
            .ebook
            .as_ref()
            .and_then(|(_, reader)| reader.current())
            .and_then(|chapter| chapter.content.get(index))
            .cloned();
        match item {
            Some(item) if item.is_speakable() => self.speak(item.text(), VoiceProfile::Content),
            Some(item) => self.emit(AppEvent::SpeakRejected {
                text: item.text().to_string(),
                reason: "only example lines can be spoken".to_string(),
            }),
            None => self.emit_error(format!("Chapter item {} is not available", index)),
        }
    }

    // -- roleplay -----------------------------------------------------------

    fn start_scenario(&mut self, scenario: Option<String>) {
        let level_id = self.resolve_level(None);
        let scenario = scenario
            .filter(|s| !s.trim().is_empty())
            .or_else(|| level_content(&level_id).scenarios.into_iter().next())
            .unwrap_or_default();

        let reuse = matches!(&self.roleplay, Some((id, _)) if *id == level_id);
        if !reuse {
            let session = RoleplaySession::new(&level_id, &self.level_name(&level_id), &scenario);
            self.roleplay = Some((level_id, session));
        }
        if let Some((_, session)) = self.roleplay.as_mut() {
            session.start_scenario(&scenario);
        }
        info!(scenario = %scenario, "Roleplay scenario started");
        self.emit_chat_history();
    }

    fn send_chat(&mut self, text: &str) {
        let Some((_, session)) = self.roleplay.as_mut() else {
            warn!("Chat message ignored: no scenario started");
            self.emit_error("No roleplay scenario started");
            return;
        };
        let Some(pending) = session.submit(text) else {
            return;
        };
        self.emit_chat_history();

        let replies = self.replies.clone();
        match self.chat_model.clone() {
            Some(model) => {
                tokio::spawn(async move {
                    let result = model
                        .reply(&pending.level_id, &pending.scenario, pending.history)
                        .await;
                    let _ = replies.send(ChatReply {
                        generation: pending.generation,
                        result,
                    });
                });
            }
            None => {
                let _ = replies.send(ChatReply {
                    generation: pending.generation,
                    result: Err(anyhow::anyhow!("roleplay model unavailable (no API key)")),
                });
            }
        }
    }

    /// Apply a finished chat request to the session.
    pub fn complete_chat(&mut self, reply: ChatReply) {
        let Some((_, session)) = self.roleplay.as_mut() else {
            return;
        };
        if session.complete(reply.generation, reply.result) {
            self.emit_chat_history();
        } else {
            debug!(generation = reply.generation, "Dropping stale chat reply");
        }
    }

    fn emit_chat_history(&self) {
        if let Some((_, session)) = &self.roleplay {
            self.emit(AppEvent::ChatHistory {
                scenario: session.scenario().to_string(),
                history: session.history().to_vec(),
                loading: session.is_loading(),
            });
        }
    }

    // -- speech -------------------------------------------------------------

    fn emit_speech_status(&self) {
        let event = match &self.speech {
            Some(pipeline) => {
                let guard = pipeline.guard();
                AppEvent::SpeechStatus {
                    speaking: guard.is_speaking(),
                    state: guard.state(),
                    current: guard.current(),
                }
            }
            None => AppEvent::SpeechStatus {
                speaking: false,
                state: SpeechState::Idle,
                current: None,
            },
        };
        self.emit(event);
    }

    fn speak(&self, text: &str, profile: VoiceProfile) {
        let Some(pipeline) = &self.speech else {
            self.emit(AppEvent::SpeakRejected {
                text: text.to_string(),
                reason: "speech unavailable".to_string(),
            });
            return;
        };

        match pipeline.try_speak(text, profile) {
            Ok((identity, handle)) => {
                self.emit(AppEvent::SpeakingStart {
                    text: identity.text.clone(),
                    profile,
                });
                let events = self.events.clone();
                tokio::spawn(async move {
                    let reason = match handle.await {
                        Ok(Ok(_)) => None,
                        Ok(Err(e)) => Some(e.to_string()),
                        Err(e) => Some(format!("speech task failed: {}", e)),
                    };
                    let _ = events.send(AppEvent::SpeakingEnd {
                        text: identity.text,
                        profile,
                        success: reason.is_none(),
                        reason,
                    });
                });
            }
            Err(e) => {
                if !e.is_rejection() {
                    warn!(%profile, "Speak request failed: {}", e);
                }
                self.emit(AppEvent::SpeakRejected {
                    text: text.to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::future::Future;
    use std::pin::Pin;

    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use tokio::sync::Notify;

    use super::*;
    use crate::audio::AudioOutput;
    use crate::chat::{ChatRole, ChatTurn, APOLOGY};
    use crate::exercise::Verdict;
    use crate::tts::pipeline::SpeechTimeouts;
    use crate::tts::SpeechSynthesizer;

    struct EchoModel;

    impl RoleplayModel for EchoModel {
        fn reply(
            &self,
            _level_id: &str,
            _scenario: &str,
            history: Vec<ChatTurn>,
        ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + '_>> {
            let last = history.last().map(|t| t.text.clone()).unwrap_or_default();
            Box::pin(async move { Ok(format!("echo: {}", last)) })
        }
    }

    struct GatedSynth {
        gate: Arc<Notify>,
    }

    impl SpeechSynthesizer for GatedSynth {
        fn synthesize(
            &self,
            _text: &str,
            _profile: VoiceProfile,
        ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + '_>> {
            Box::pin(async move {
                self.gate.notified().await;
                Ok(STANDARD.encode([0x00, 0x80, 0xFF, 0x7F]))
            })
        }

        fn name(&self) -> String {
            "gated".to_string()
        }
    }

    struct NullOutput;

    impl AudioOutput for NullOutput {
        fn play(
            &self,
            _samples: Vec<f32>,
            _sample_rate: u32,
        ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + '_>> {
            Box::pin(async { Ok(()) })
        }

        fn stop(&self) {}
    }

    fn app(
        speech: Option<SpeechPipeline>,
        model: Option<Arc<dyn RoleplayModel>>,
    ) -> (
        App,
        mpsc::UnboundedReceiver<AppEvent>,
        mpsc::UnboundedReceiver<ChatReply>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (app, replies) = App::new(Some(42), speech, model, tx);
        (app, rx, replies)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<AppEvent>) -> Vec<AppEvent> {
        let mut out = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            out.push(ev);
        }
        out
    }

    fn last_snapshot(events: &[AppEvent]) -> crate::exercise::ExerciseSnapshot {
        events
            .iter()
            .rev()
            .find_map(|e| match e {
                AppEvent::Exercise { snapshot, .. } => Some(snapshot.clone()),
                _ => None,
            })
            .expect("no exercise event")
    }

    #[tokio::test]
    async fn test_ping_and_stop() {
        let (mut app, mut rx, _) = app(None, None);
        assert!(app.handle_command(AppCommand::Ping {}));
        assert!(!app.handle_command(AppCommand::Stop {}));
        let events = drain(&mut rx);
        assert!(matches!(events[0], AppEvent::Pong {}));
        assert!(matches!(events[1], AppEvent::Stopping {}));
    }

    #[tokio::test]
    async fn test_select_and_unlock_levels() {
        let (mut app, mut rx, _) = app(None, None);
        app.handle_command(AppCommand::SelectLevel {
            level_id: "N3".into(),
        });
        assert!(matches!(drain(&mut rx)[0], AppEvent::Error { .. }));

        app.handle_command(AppCommand::SelectLevel {
            level_id: "N4".into(),
        });
        app.handle_command(AppCommand::UnlockNextLevel {});
        let events = drain(&mut rx);
        assert!(matches!(&events[0], AppEvent::LevelSelected { level } if level.id == "N4"));
        assert!(matches!(&events[1], AppEvent::LevelUnlocked { level } if level.id == "N3"));

        app.handle_command(AppCommand::SelectLevel {
            level_id: "ALPHABET".into(),
        });
        let events = drain(&mut rx);
        assert!(matches!(&events[0], AppEvent::Alphabet { hiragana, .. } if hiragana.len() == 46));
    }

    #[tokio::test]
    async fn test_exercise_flow_through_commands() {
        let (mut app, mut rx, _) = app(None, None);
        app.handle_command(AppCommand::LoadExercise {
            level_id: None,
            index: 0,
        });
        let snap = last_snapshot(&drain(&mut rx));
        assert_eq!(snap.index, 0);
        assert_eq!(snap.total, 5);
        assert!(snap.constructed.is_empty());

        // Hints alone build the full answer.
        for _ in 0..snap.pool.len() {
            app.handle_command(AppCommand::Hint {});
        }
        app.handle_command(AppCommand::CheckExercise {});
        let events = drain(&mut rx);
        assert!(events.iter().any(|e| matches!(
            e,
            AppEvent::Verdict {
                verdict: Verdict::Correct,
                ..
            }
        )));
        let snap = last_snapshot(&events);
        assert!(snap.pool.is_empty());
        assert!(!snap.hint_available);

        app.handle_command(AppCommand::ReturnToPool { position: 0 });
        let snap = last_snapshot(&drain(&mut rx));
        assert_eq!(snap.pool.len(), 1);
        assert!(snap.feedback.is_none());

        app.handle_command(AppCommand::NextExercise {});
        assert_eq!(last_snapshot(&drain(&mut rx)).index, 1);
    }

    #[tokio::test]
    async fn test_exercise_commands_without_exercise() {
        let (mut app, mut rx, _) = app(None, None);
        app.handle_command(AppCommand::Hint {});
        app.handle_command(AppCommand::ResetExercise {});
        let events = drain(&mut rx);
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| matches!(e, AppEvent::Error { .. })));
    }

    #[tokio::test]
    async fn test_chapters() {
        let (mut app, mut rx, _) = app(None, None);
        app.handle_command(AppCommand::ListChapters {
            level_id: Some("N4".into()),
        });
        let events = drain(&mut rx);
        assert!(matches!(&events[0], AppEvent::Chapters { titles, .. } if titles.len() == 4));
        assert!(matches!(&events[1], AppEvent::Chapter { index: 0, .. }));

        app.handle_command(AppCommand::SelectChapter { index: 2 });
        app.handle_command(AppCommand::SelectChapter { index: 9 });
        let events = drain(&mut rx);
        assert!(matches!(&events[0], AppEvent::Chapter { index: 2, .. }));
        assert!(matches!(&events[1], AppEvent::Error { .. }));

        app.handle_command(AppCommand::ListChapters {
            level_id: Some("N3".into()),
        });
        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], AppEvent::Chapters { titles, .. } if titles.is_empty()));
    }

    #[tokio::test]
    async fn test_chat_round_trip() {
        let (mut app, mut rx, mut replies) = app(None, Some(Arc::new(EchoModel)));
        app.handle_command(AppCommand::StartScenario { scenario: None });
        let events = drain(&mut rx);
        assert!(
            matches!(&events[0], AppEvent::ChatHistory { scenario, history, loading: false }
                if scenario == "Memesan di kafe" && history.len() == 1)
        );

        app.handle_command(AppCommand::SendChat {
            text: "こんにちは".into(),
        });
        assert!(matches!(
            &drain(&mut rx)[0],
            AppEvent::ChatHistory { loading: true, .. }
        ));

        let reply = replies.recv().await.unwrap();
        app.complete_chat(reply);
        match &drain(&mut rx)[0] {
            AppEvent::ChatHistory {
                history, loading, ..
            } => {
                assert!(!loading);
                assert_eq!(history.len(), 3);
                assert_eq!(history[2].role, ChatRole::Model);
                assert_eq!(history[2].text, "echo: こんにちは");
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_chat_without_model_apologizes() {
        let (mut app, mut rx, mut replies) = app(None, None);
        app.handle_command(AppCommand::StartScenario {
            scenario: Some("Menanyakan arah".into()),
        });
        app.handle_command(AppCommand::SendChat { text: "はい".into() });
        app.complete_chat(replies.recv().await.unwrap());
        let events = drain(&mut rx);
        match events.last() {
            Some(AppEvent::ChatHistory { history, .. }) => {
                assert_eq!(history.last(), Some(&ChatTurn::model(APOLOGY)));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_speak_without_pipeline_is_rejected() {
        let (mut app, mut rx, _) = app(None, None);
        app.handle_command(AppCommand::SpeakContent { text: "ねこ".into() });
        assert!(matches!(
            &drain(&mut rx)[0],
            AppEvent::SpeakRejected { reason, .. } if reason == "speech unavailable"
        ));
    }

    #[tokio::test]
    async fn test_speak_single_flight_events() {
        let gate = Arc::new(Notify::new());
        let pipeline = SpeechPipeline::new(
            Arc::new(GatedSynth { gate: gate.clone() }),
            Arc::new(NullOutput),
            SpeechTimeouts::default(),
        );
        let (mut app, mut rx, _) = app(Some(pipeline), None);

        app.handle_command(AppCommand::SpeakContent { text: "ねこ".into() });
        app.handle_command(AppCommand::SpeakGuidance {
            text: "Pilih level".into(),
        });
        let events = drain(&mut rx);
        assert!(matches!(
            &events[0],
            AppEvent::SpeakingStart { text, profile: VoiceProfile::Content } if text == "ねこ"
        ));
        assert!(matches!(
            &events[1],
            AppEvent::SpeakRejected { text, .. } if text == "Pilih level"
        ));

        gate.notify_one();
        match rx.recv().await.unwrap() {
            AppEvent::SpeakingEnd {
                text,
                success,
                reason,
                ..
            } => {
                assert_eq!(text, "ねこ");
                assert!(success);
                assert!(reason.is_none());
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_speak_chapter_item_only_for_examples() {
        let gate = Arc::new(Notify::new());
        let pipeline = SpeechPipeline::new(
            Arc::new(GatedSynth { gate: gate.clone() }),
            Arc::new(NullOutput),
            SpeechTimeouts::default(),
        );
        let (mut app, mut rx, _) = app(Some(pipeline), None);

        app.handle_command(AppCommand::SpeakChapterItem { index: 0 });
        assert!(matches!(&drain(&mut rx)[0], AppEvent::Error { .. }));

        app.handle_command(AppCommand::ListChapters {
            level_id: Some("N4".into()),
        });
        drain(&mut rx);

        app.handle_command(AppCommand::SpeakChapterItem { index: 0 });
        app.handle_command(AppCommand::SpeakChapterItem { index: 2 });
        app.handle_command(AppCommand::SpeakChapterItem { index: 99 });
        let events = drain(&mut rx);
        assert!(matches!(
            &events[0],
            AppEvent::SpeakRejected { text, .. } if text.starts_with("Memahami")
        ));
        assert!(matches!(
            &events[1],
            AppEvent::SpeakingStart { text, profile: VoiceProfile::Content }
                if text.starts_with("わたしはがくせいです。")
        ));
        assert!(matches!(&events[2], AppEvent::Error { .. }));

        gate.notify_one();
        assert!(matches!(
            rx.recv().await.unwrap(),
            AppEvent::SpeakingEnd { success: true, .. }
        ));
    }

    #[tokio::test]
    async fn test_speech_status_tracks_the_guard() {
        let (mut idle, mut idle_rx, _) = app(None, None);
        idle.handle_command(AppCommand::GetSpeechStatus {});
        assert!(matches!(
            &drain(&mut idle_rx)[0],
            AppEvent::SpeechStatus {
                speaking: false,
                state: SpeechState::Idle,
                current: None
            }
        ));

        let gate = Arc::new(Notify::new());
        let pipeline = SpeechPipeline::new(
            Arc::new(GatedSynth { gate: gate.clone() }),
            Arc::new(NullOutput),
            SpeechTimeouts::default(),
        );
        let (mut app, mut rx, _) = app(Some(pipeline), None);
        app.handle_command(AppCommand::SpeakContent { text: "ねこ".into() });
        app.handle_command(AppCommand::GetSpeechStatus {});
        let events = drain(&mut rx);
        match &events[1] {
            AppEvent::SpeechStatus {
                speaking,
                state,
                current,
            } => {
                assert!(*speaking);
                assert_eq!(*state, SpeechState::Requesting);
                assert_eq!(current.as_ref().map(|c| c.text.as_str()), Some("ねこ"));
            }
            other => panic!("unexpected event {:?}", other),
        }

        gate.notify_one();
        assert!(matches!(rx.recv().await.unwrap(), AppEvent::SpeakingEnd { .. }));
        app.handle_command(AppCommand::GetSpeechStatus {});
        assert!(matches!(
            &drain(&mut rx)[0],
            AppEvent::SpeechStatus { speaking: false, .. }
        ));
    }
}
