//! External generative service.

/// Gemini `generateContent` client.
pub mod gemini;
