// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Time-delayed ticket state transitions.
//!
//! Tickets that sit without activity are reminded about and eventually closed. Both transitions
//! are durable jobs in the `lifecycle_jobs` table; the scheduler owns the rows, and the worker
//! fires whatever is due on a fixed tick. A Redis claim guards each firing so that running more
//! than one bot process never double-fires a job.

mod scheduler;
mod worker;

pub use scheduler::LifecycleScheduler;
pub use worker::run_worker;
