//! The conversational policy directive.
//!
//! The directive is data, not code: the staged conversation flow (Welcome →
//! Explore → Deepen/Reflect → Options/Micro-habits → Commit), the crisis
//! override, and the turn-shape rules are executed by the upstream model
//! reading this text, never re-derived by local branching. The text is
//! embedded at compile time and versioned so that any edit is deliberate
//! and shows up in the snapshot tests below.

/// Version tag for the directive text. Bump on any edit.
pub const DIRECTIVE_VERSION: &str = "2026-02";

/// The full system directive sent with every reasoning call.
pub const DIRECTIVE: &str = include_str!("directive.md");

/// The fixed crisis response, sentence by sentence. Any self-harm or
/// harm-to-others signal short-circuits all staging; the model is
/// instructed to reply with exactly these three sentences.
pub const CRISIS_RESPONSE: [&str; 3] = [
    "I'm really sorry you're feeling like this.",
    "I'm here with you.",
    "If you feel unsafe, please consider reaching out to a mental-health professional or emergency services in Nigeria right now.",
];
