//! # plugkit - Command and GUI Toolkit for Game-Server Plugins
//!
//! plugkit sits between a game-server host and plugin code. The host owns the
//! process, the event thread, actors and containers; plugkit validates the
//! command invocations and routes the inventory events the host delivers.
//!
//! ## Features
//!
//! - **Command Pipeline**: permission, sender-kind and argument-count rules in a fixed order, then custom error handlers, then exactly one callback.
//! - **Typed Arguments**: bounds-checked accessors that fall back to defaults instead of failing.
//! - **Inventory GUIs**: per-container click routing with last-write-wins callbacks and per-item handlers.
//! - **Pagination**: paged containers driven by sentinel items, with a documented page boundary policy.
//! - **Task Scheduling**: one-shot and repeating jobs on the event thread or a tokio runtime.
//! - **Config-Driven**: commands and default messages declared in TOML.
//!
//! ## Quick Start
//!
//! ```rust
//! use plugkit::command::{CommandHandler, CommandInvocation, Outcome, SenderPolicy};
//! use plugkit::host::{memory::MemoryHost, Actor};
//!
//! let handler = CommandHandler::<MemoryHost>::builder("heal", SenderPolicy::InteractiveOnly, 0)
//!     .require_permission("kit.heal")
//!     .on_execute(|host, exec| {
//!         exec.reply(host, "You feel better.");
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! let mut host = MemoryHost::new();
//! let alice = Actor::player("alice");
//! host.grant_permission(&alice, "kit.heal");
//! let outcome = handler
//!     .handle(&mut host, &CommandInvocation::new(alice.clone(), "heal", vec![]))
//!     .unwrap();
//! assert_eq!(outcome, Outcome::Dispatched);
//! assert_eq!(host.messages_for(&alice), vec!["You feel better."]);
//! ```
//!
//! ## Module Organization
//!
//! - [`command`] - validation pipeline, argument accessors and the command registry
//! - [`gui`] - click routing, paginated GUIs and the GUI manager
//! - [`host`] - the traits plugkit needs from a host, plus an in-memory host
//! - [`task`] - tick-based task scheduling
//! - [`config`] - configuration loading and validation
//! - [`validation`] - name, permission node and container size checks
//! - [`metrics`] - process-wide counters
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐      ┌─────────────────┐
//! │ command events  │      │  click / close  │ ← delivered by the host
//! └─────────────────┘      └─────────────────┘
//!          │                        │
//! ┌─────────────────┐      ┌─────────────────┐
//! │ CommandRegistry │      │   GuiManager    │ ← lookup by label / container
//! │ CommandHandler  │      │ GuiRouter, Page │
//! └─────────────────┘      └─────────────────┘
//!          │                        │
//! ┌──────────────────────────────────────────┐
//! │     ActorHost / ContainerHost traits     │ ← messages, permissions, slots
//! └──────────────────────────────────────────┘
//! ```

pub mod command;
pub mod config;
pub mod error;
pub mod gui;
pub mod host;
pub mod logutil;
pub mod metrics;
#[cfg(feature = "replay")]
pub mod replay;
pub mod task;
pub mod validation;

pub use error::{KitError, KitResult};
