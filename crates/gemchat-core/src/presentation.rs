//! Welcome text and prompt suggestions shown on an empty conversation.

use rand::seq::SliceRandom;
use rand::Rng;

/// How many suggestions are offered at once
pub const SUGGESTION_COUNT: usize = 4;

/// Delay between picking a suggestion and submitting it
pub const SUGGESTION_SUBMIT_DELAY_MS: u64 = 100;

pub const WELCOME_TITLE: &str = "Gemini AI Assistant";

pub const WELCOME_HINT: &str = "Pick a suggestion below or type your own message";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Suggestion {
    pub icon: &'static str,
    pub text: &'static str,
    pub category: &'static str,
}

pub const SUGGESTIONS: &[Suggestion] = &[
    Suggestion {
        icon: "💡",
        text: "Explain quantum computing in simple terms",
        category: "Science",
    },
    Suggestion {
        icon: "⌨",
        text: "Write a Python function to reverse a string",
        category: "Programming",
    },
    Suggestion {
        icon: "✎",
        text: "Write a short creative story about a robot learning emotions",
        category: "Creative",
    },
    Suggestion {
        icon: "🧠",
        text: "What are the benefits of meditation for mental health?",
        category: "Health",
    },
    Suggestion {
        icon: "📈",
        text: "Explain blockchain technology like I'm a beginner",
        category: "Technology",
    },
    Suggestion {
        icon: "📖",
        text: "Summarize the key lessons from 'Atomic Habits'",
        category: "Books",
    },
    Suggestion {
        icon: "🧮",
        text: "How do I calculate compound interest?",
        category: "Finance",
    },
    Suggestion {
        icon: "🗾",
        text: "What are the must-visit places in Japan?",
        category: "Travel",
    },
];

pub const WELCOME_MESSAGES: &[&str] = &[
    "Hello! I'm your AI assistant. How can I help you today?",
    "Hi there! I'm here to answer your questions and help with tasks.",
    "Welcome! Ask me anything - I'm ready to assist you.",
    "Hello! I'm excited to help you learn and explore new ideas.",
];

/// A random selection of distinct suggestions, in random order
pub fn pick_suggestions<R: Rng + ?Sized>(rng: &mut R) -> Vec<Suggestion> {
    SUGGESTIONS
        .choose_multiple(rng, SUGGESTION_COUNT)
        .copied()
        .collect()
}

pub fn pick_welcome<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    WELCOME_MESSAGES.choose(rng).copied().unwrap_or(WELCOME_MESSAGES[0])
}
