/// State management module
///
/// This module handles all application state, including:
/// - Caption text and positions for the current photo (caption.rs)
/// - Shared data structures (data.rs)
/// - The catalog of saved pictures (media_index.rs)
/// - Session state carried across restarts (session.rs)

pub mod caption;
pub mod data;
pub mod media_index;
pub mod session;
