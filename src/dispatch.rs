//! The dispatcher. Public API for queueing and running conversions.
//!
//! Owns the store, the worker slots, and the assignment map; every state
//! transition goes through here. Completions from the slots are funneled
//! over a single channel and handled one at a time, so the store and map
//! only ever have one writer.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use crate::event::{Event, EventKind, Notifier};
use crate::model::{EffectiveStatus, ItemView, Status, WorkId};
use crate::slot::{CommandRunner, ProcessRunner, SlotCompletion, SlotId, WorkerSlot};
use crate::store::Store;

/// Default scale percentage applied to every conversion.
pub const DEFAULT_SCALE: f64 = 50.0;

/// Bounded-concurrency dispatcher over a pool of worker slots.
pub struct Dispatcher<R = CommandRunner> {
    store: Store,
    slots: Vec<WorkerSlot<R>>,
    /// Current slot → in-flight item bindings. An item appears at most
    /// once among the values; size never exceeds the pool.
    assignments: HashMap<SlotId, WorkId>,
    scale: f64,
    convert_bin: String,
    notifier: Notifier,
    completions: mpsc::UnboundedReceiver<SlotCompletion>,
}

impl Dispatcher<CommandRunner> {
    /// Create a dispatcher that runs the real convert binary.
    pub fn new(pool_size: usize, convert_bin: impl Into<String>) -> Self {
        Self::with_runner(pool_size, convert_bin, CommandRunner)
    }
}

impl<R: ProcessRunner> Dispatcher<R> {
    /// Create a dispatcher with a custom process runner (used by tests).
    ///
    /// # Panics
    ///
    /// Panics if `pool_size` is zero.
    pub fn with_runner(pool_size: usize, convert_bin: impl Into<String>, runner: R) -> Self {
        assert!(pool_size >= 1, "pool size must be at least 1");

        let (tx, rx) = mpsc::unbounded_channel();
        let runner = Arc::new(runner);
        let slots = (0..pool_size)
            .map(|i| WorkerSlot::new(SlotId(i), Arc::clone(&runner), tx.clone()))
            .collect();

        Self {
            store: Store::new(),
            slots,
            assignments: HashMap::new(),
            scale: DEFAULT_SCALE,
            convert_bin: convert_bin.into(),
            notifier: Notifier::new(),
            completions: rx,
        }
    }

    // -----------------------------------------------------------------------
    // Observation
    // -----------------------------------------------------------------------

    /// Subscribe to dispatcher events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.notifier.subscribe()
    }

    /// Snapshot of all items in queue order, with Running derived from
    /// the assignment map.
    pub fn items(&self) -> Vec<ItemView> {
        let in_flight: HashSet<WorkId> = self.assignments.values().copied().collect();
        self.store
            .items()
            .iter()
            .map(|item| ItemView {
                id: item.id,
                source: item.source.clone(),
                destination: item.destination.clone(),
                status: EffectiveStatus::from_stored(&item.status, in_flight.contains(&item.id)),
            })
            .collect()
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn template(&self) -> Option<&str> {
        self.store.template()
    }

    /// True while at least one slot has work in flight.
    pub fn is_running(&self) -> bool {
        !self.assignments.is_empty()
    }

    /// Number of items currently assigned to slots.
    pub fn in_flight(&self) -> usize {
        self.assignments.len()
    }

    // -----------------------------------------------------------------------
    // Queue mutation
    // -----------------------------------------------------------------------

    /// Queue new source files.
    pub fn add(&mut self, paths: Vec<String>) {
        if paths.is_empty() {
            return;
        }
        let derived = self.store.add(paths);
        self.notifier.emit(EventKind::ItemsChanged);
        if derived {
            self.emit_template_changed();
        }
    }

    /// Remove items at the given positions. In-flight items are removed
    /// without killing their processes; the eventual completion is
    /// discarded when its ID lookup misses.
    pub fn remove(&mut self, indices: &[usize]) {
        self.store.remove(indices);
        self.notifier.emit(EventKind::ItemsChanged);
    }

    /// Re-queue every item, whatever its status. Does not cancel in-flight
    /// processes.
    pub fn reset(&mut self) {
        self.store.reset();
        self.notifier.emit(EventKind::ItemsChanged);
    }

    /// Drop all items and unset the template.
    pub fn clear(&mut self) {
        self.store.clear();
        self.notifier.emit(EventKind::ItemsChanged);
        self.emit_template_changed();
    }

    /// Set the shared scale percentage. Emits only on an actual change.
    pub fn set_scale(&mut self, scale: f64) {
        if scale != self.scale {
            self.scale = scale;
            self.notifier.emit(EventKind::ScaleChanged { scale });
        }
    }

    /// Replace the destination template and recompute all destinations.
    pub fn set_template(&mut self, tmpl: &str) {
        self.store.set_template(tmpl);
        self.emit_template_changed();
        self.notifier.emit(EventKind::ItemsChanged);
    }

    // -----------------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------------

    /// Assign waiting items to free slots. Safe to call at any time:
    /// busy slots are skipped and items already assigned anywhere are
    /// never candidates, so nothing is ever double-dispatched.
    pub fn run(&mut self) {
        let was_running = self.is_running();
        for i in 0..self.slots.len() {
            self.try_assign(SlotId(i));
        }
        self.emit_running_transition(was_running);
    }

    /// Handle one slot completion. This is the single entry point for the
    /// event loop; `run_to_completion` calls it for every message.
    ///
    /// # Panics
    ///
    /// Panics if the slot has no assignment. A completion can only follow
    /// a start, so a missing entry means a dispatch bug.
    pub fn on_slot_finished(&mut self, completion: SlotCompletion) {
        let was_running = self.is_running();
        let SlotCompletion {
            slot,
            exit_code,
            output,
        } = completion;

        let Some(id) = self.assignments.remove(&slot) else {
            panic!("completion for {slot} with no assignment map entry");
        };

        let status = if exit_code == 0 {
            Status::Ok
        } else {
            Status::Failed { error: output }
        };

        if self.store.set_status(id, status.clone()) {
            match status {
                Status::Ok => info!(%slot, item = %id, "conversion ok"),
                Status::Failed { ref error } => {
                    warn!(%slot, item = %id, error, "conversion failed")
                }
                Status::Waiting => unreachable!(),
            }
            self.notifier.emit(EventKind::ItemsChanged);
        } else {
            debug!(%slot, item = %id, "completion for removed item, discarding");
        }

        self.try_assign(slot);
        self.emit_running_transition(was_running);
    }

    /// Start the pool and consume completions until every slot is idle.
    pub async fn run_to_completion(&mut self) {
        self.run();
        while self.is_running() {
            // channel can't close: every slot holds a sender
            match self.completions.recv().await {
                Some(completion) => self.on_slot_finished(completion),
                None => break,
            }
        }
    }

    /// Attempt to assign the oldest waiting unassigned item to a slot.
    /// Leaves the slot idle when it is busy or no candidate exists.
    fn try_assign(&mut self, slot: SlotId) {
        if self.assignments.contains_key(&slot) {
            return;
        }

        let in_flight: HashSet<WorkId> = self.assignments.values().copied().collect();
        let Some(item) = self
            .store
            .items()
            .iter()
            .find(|item| item.status == Status::Waiting && !in_flight.contains(&item.id))
        else {
            return;
        };

        let id = item.id;
        let args = vec![
            item.source.clone(),
            "-resize".to_string(),
            format!("{}%", self.scale),
            item.destination.clone(),
        ];

        info!(%slot, item = %id, source = %item.source, "assigned");
        self.assignments.insert(slot, id);
        self.slots[slot.0].start(self.convert_bin.clone(), args);
    }

    fn emit_template_changed(&self) {
        self.notifier.emit(EventKind::TemplateChanged {
            template: self.store.template().map(str::to_string),
        });
    }

    fn emit_running_transition(&self, was_running: bool) {
        let running = self.is_running();
        if running != was_running {
            self.notifier.emit(EventKind::RunningChanged { running });
        }
    }
}
