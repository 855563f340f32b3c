//! Roleplay tutor conversation ("Latihan AI").
//!
//! The session keeps the conversation history and the in-flight flag; the
//! reply itself comes from a [`RoleplayModel`] collaborator. Requests are
//! split into `submit` / `complete` so the caller can run the network call
//! in the background while the session stays owned by one task.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use tracing::{error, warn};

/// Shown in place of a reply when the collaborator fails.
pub const APOLOGY: &str = "Maaf, terjadi kesalahan. Silakan coba lagi.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            text: text.into(),
        }
    }
}

/// Conversational collaborator (dyn-compatible).
pub trait RoleplayModel: Send + Sync {
    /// Produce the next model turn. The last entry of `history` is the
    /// user's new message.
    fn reply(
        &self,
        level_id: &str,
        scenario: &str,
        history: Vec<ChatTurn>,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + '_>>;
}

/// Register and complexity guidance per JLPT level.
pub fn level_instructions(level_id: &str) -> &'static str {
    match level_id {
        "N4" => "Gunakan bahasa Jepang percakapan sehari-hari yang sederhana. Fokus pada tata bahasa dasar (bentuk masu/-te) dan kosakata umum. Buat kalimat tetap pendek dan jelas.",
        "N3" => "Gunakan bahasa Jepang percakapan alami yang cocok untuk situasi sehari-hari. Anda bisa memperkenalkan tata bahasa dan kosakata yang sedikit lebih kompleks. Jelaskan nuansa jika pengguna tampak bingung.",
        "N2" => "Gunakan bahasa Jepang yang lebih formal dan bernuansa, termasuk beberapa Keigo (bahasa sopan) dasar jika sesuai dengan konteks bisnis. Kosakata Anda harus lebih luas.",
        "N1" => "Gunakan bahasa Jepang tingkat lanjut, formal, dan terkadang akademis. Tata bahasa dan kosakata Anda harus kompleks dan tepat. Jangan ragu untuk menggunakan ekspresi idiomatik.",
        _ => "Gunakan bahasa Jepang percakapan sehari-hari yang sederhana.",
    }
}

/// Tutor persona prompt for a level and scenario.
pub fn system_instruction(level_id: &str, scenario: &str) -> String {
    format!(
        "Anda adalah seorang tutor bahasa Jepang yang cerdas dan adaptif. Peran Anda adalah terlibat dalam percakapan roleplay dengan seorang siswa.
- Tingkat kemahiran siswa adalah JLPT {level}. Patuhi instruksi ini: {instructions}.
- Skenario saat ini adalah: \"{scenario}\".
- Jika pengguna mengetik dalam Bahasa Indonesia, tanggapi dalam Bahasa Jepang sederhana dan berikan terjemahan Bahasa Indonesia dalam tanda kurung. Contoh: はい、そうです。(Ya, benar.).
- Jika pengguna membuat kesalahan dalam Bahasa Jepang, koreksi dengan lembut setelah respons Anda, jelaskan koreksinya secara singkat dalam Bahasa Indonesia. Contoh: *Koreksi: 日本へ行きました (Nihon e ikimashita) lebih alami daripada 日本を行きました (Nihon o ikimashita).*
- Jaga agar respons Anda tetap ringkas dan fokus pada roleplay.
- Ajukan pertanyaan lanjutan untuk mendorong siswa memberikan jawaban yang lebih panjang dan mendetail.
- Sesekali, perkenalkan kosakata baru yang relevan dengan topik dan level siswa, dan jelaskan artinya.
- Jika relevan, berikan sedikit konteks budaya tentang frasa atau kebiasaan yang didiskusikan.
- Tujuan Anda adalah membantu pengguna berlatih dan belajar secara aktif. Jadilah ramah, memberi semangat, dan dinamis. Aplikasi ini hanya untuk pembelajaran antara bahasa Jepang dan Indonesia.",
        level = level_id,
        instructions = level_instructions(level_id),
        scenario = scenario,
    )
}

/// A request handed out by [`RoleplaySession::submit`].
#[derive(Debug, Clone)]
pub struct PendingReply {
    pub generation: u64,
    pub level_id: String,
    pub scenario: String,
    pub history: Vec<ChatTurn>,
}

#[derive(Debug, Clone)]
pub struct RoleplaySession {
    level_id: String,
    level_name: String,
    scenario: String,
    history: Vec<ChatTurn>,
    loading: bool,
    /// Bumped on every scenario start so late replies to an old
    /// conversation are dropped.
    generation: u64,
}

impl RoleplaySession {
    pub fn new(level_id: &str, level_name: &str, scenario: &str) -> Self {
        Self {
            level_id: level_id.to_string(),
            level_name: level_name.to_string(),
            scenario: scenario.to_string(),
            history: Vec::new(),
            loading: false,
            generation: 0,
        }
    }

    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }

    pub fn scenario(&self) -> &str {
        &self.scenario
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Switch to `scenario` and open with the tutor's first line.
    pub fn start_scenario(&mut self, scenario: &str) {
        self.scenario = scenario.to_string();
        self.generation += 1;
        self.loading = false;
        self.history = vec![ChatTurn::model(format!(
            "Baik, mari kita mulai skenario \"{}\" untuk level {}. Saya akan mulai.\n\nこんにちは！ご注文は？\n(Halo! Apa pesanan Anda?)",
            self.scenario, self.level_name
        ))];
    }

    /// Append the user's message and hand back the request to send.
    ///
    /// Blank input, or input while a reply is pending, is ignored.
    pub fn submit(&mut self, input: &str) -> Option<PendingReply> {
        if input.trim().is_empty() {
            return None;
        }
        if self.loading {
            warn!("Chat message ignored: reply still pending");
            return None;
        }
        self.history.push(ChatTurn::user(input));
        self.loading = true;
        Some(PendingReply {
            generation: self.generation,
            level_id: self.level_id.clone(),
            scenario: self.scenario.clone(),
            history: self.history.clone(),
        })
    }

    /// Record the collaborator's answer (or an apology on failure).
    ///
    /// Returns `false` if the reply belongs to a conversation that has
    /// since been restarted.
    pub fn complete(&mut self, generation: u64, reply: anyhow::Result<String>) -> bool {
        if generation != self.generation {
            return false;
        }
        self.loading = false;
        let text = match reply {
            Ok(text) => text,
            Err(e) => {
                error!(scenario = %self.scenario, "Roleplay reply failed: {:#}", e);
                APOLOGY.to_string()
            }
        };
        self.history.push(ChatTurn::model(text));
        true
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    struct ScriptedModel {
        reply: Result<String, String>,
        seen: Mutex<Vec<(String, String, Vec<ChatTurn>)>>,
    }

    impl ScriptedModel {
        fn new(reply: Result<&str, &str>) -> Self {
            Self {
                reply: reply.map(str::to_string).map_err(str::to_string),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    /// `submit` + `complete` in one go, the way the app drives a turn.
    async fn send(s: &mut RoleplaySession, input: &str, model: &dyn RoleplayModel) -> bool {
        let Some(pending) = s.submit(input) else {
            return false;
        };
        let reply = model
            .reply(&pending.level_id, &pending.scenario, pending.history)
            .await;
        s.complete(pending.generation, reply)
    }

    impl RoleplayModel for ScriptedModel {
        fn reply(
            &self,
            level_id: &str,
            scenario: &str,
            history: Vec<ChatTurn>,
        ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + '_>> {
            self.seen
                .lock()
                .unwrap()
                .push((level_id.to_string(), scenario.to_string(), history));
            let reply = self.reply.clone();
            Box::pin(async move { reply.map_err(|e| anyhow::anyhow!(e)) })
        }
    }

    fn session() -> RoleplaySession {
        let mut s = RoleplaySession::new("N4", "N4", "Memesan di kafe");
        s.start_scenario("Memesan di kafe");
        s
    }

    #[test]
    fn test_start_scenario_opening_turn() {
        let s = session();
        assert_eq!(s.history().len(), 1);
        assert_eq!(s.history()[0].role, ChatRole::Model);
        assert!(s.history()[0]
            .text
            .starts_with("Baik, mari kita mulai skenario \"Memesan di kafe\" untuk level N4."));
        assert!(s.history()[0].text.contains("こんにちは！ご注文は？"));
    }

    #[tokio::test]
    async fn test_send_appends_reply() {
        let model = ScriptedModel::new(Ok("コーヒーをください。"));
        let mut s = session();
        assert!(send(&mut s, "Saya mau kopi", &model).await);
        assert_eq!(s.history().len(), 3);
        assert_eq!(s.history()[1], ChatTurn::user("Saya mau kopi"));
        assert_eq!(s.history()[2], ChatTurn::model("コーヒーをください。"));
        assert!(!s.is_loading());

        let seen = model.seen.lock().unwrap();
        let (level, scenario, history) = &seen[0];
        assert_eq!(level, "N4");
        assert_eq!(scenario, "Memesan di kafe");
        assert_eq!(history.last(), Some(&ChatTurn::user("Saya mau kopi")));
    }

    #[tokio::test]
    async fn test_failure_appends_apology() {
        let model = ScriptedModel::new(Err("network down"));
        let mut s = session();
        assert!(send(&mut s, "こんにちは", &model).await);
        assert_eq!(s.history().last(), Some(&ChatTurn::model(APOLOGY)));
        assert!(!s.is_loading());
    }

    #[tokio::test]
    async fn test_blank_input_ignored() {
        let model = ScriptedModel::new(Ok("x"));
        let mut s = session();
        assert!(!send(&mut s, "   ", &model).await);
        assert_eq!(s.history().len(), 1);
        assert!(model.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_submit_while_loading_ignored() {
        let mut s = session();
        assert!(s.submit("はい").is_some());
        assert!(s.is_loading());
        assert!(s.submit("もう一度").is_none());
        assert_eq!(s.history().len(), 2);
    }

    #[test]
    fn test_stale_reply_dropped_after_restart() {
        let mut s = session();
        let pending = s.submit("はい").unwrap();
        s.start_scenario("Menanyakan arah");
        assert!(!s.complete(pending.generation, Ok("late".into())));
        assert_eq!(s.history().len(), 1);
        assert!(!s.is_loading());
    }

    #[test]
    fn test_system_instruction_mentions_level_and_scenario() {
        let prompt = system_instruction("N3", "Membuat rencana dengan teman");
        assert!(prompt.contains("JLPT N3"));
        assert!(prompt.contains(level_instructions("N3")));
        assert!(prompt.contains("\"Membuat rencana dengan teman\""));
        assert_eq!(
            level_instructions("ALPHABET"),
            "Gunakan bahasa Jepang percakapan sehari-hari yang sederhana."
        );
    }
}
