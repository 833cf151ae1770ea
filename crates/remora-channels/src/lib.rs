//! Channel adapters for the remora reminder bot
//!
//! This crate defines the delivery seams the organizer talks through
//! ([`Notifier`], [`ConfirmationWaiter`]) and the Discord (serenity)
//! implementations of both.

pub mod discord;
pub mod notifier;

pub use discord::{DiscordNotifier, ReplyRouter};
pub use notifier::{ConfirmationWaiter, DeliveryError, Notifier};
