//! Application layer use cases for the upgrade command.
//!
//! # What is the "application" layer? (for beginners)
//!
//! In Clean Architecture the *application* layer sits between the domain
//! (pure rules, here the `envup-core` crate) and the infrastructure (files,
//! processes, environment variables).
//!
//! Use cases in this layer:
//!
//! - **Orchestrate** domain objects and collaborators to fulfil an operator
//!   goal ("upgrade this installation").
//! - **Depend on abstractions** (traits) rather than concrete implementations,
//!   so the infrastructure can be swapped without changing this code and
//!   every step can be tested with doubles.
//! - **Contain no OS calls, no process spawning, no file system access**.
//!
//! # Sub-modules
//!
//! - **`upgrade_gate`** – The three precondition checks that must pass
//!   before anything is touched: installed, no deployments in flight,
//!   dependencies freshly installed.
//!
//! - **`update_configuration`** – The seam through which the orchestrator
//!   asks for the `.env` merge to run.
//!
//! - **`orchestrate_upgrade`** – Sequences gate, maintenance mode, merge,
//!   migrations, optimisation and queue restart, and decides what happens
//!   when one of them fails.

pub mod orchestrate_upgrade;
pub mod update_configuration;
pub mod upgrade_gate;
