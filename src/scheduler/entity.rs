//! RAS scheduling entities
//!
//! One entity per task, stored in a fixed table indexed by [`TaskId`]. Run
//! queue membership is a pair of prev/next indices inside the entity, so
//! linking, unlinking and moving are O(1) without pointers into task memory.

use crate::error::RasError;

use super::classify::TaskClass;
use super::types::{CpuId, TaskId, MAX_RAS_TASKS, RAS_MAX_WEIGHT};

/// Position of a linked entity in its run list
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct RunLink {
    pub(crate) cpu: CpuId,
    pub(crate) prev: Option<TaskId>,
    pub(crate) next: Option<TaskId>,
}

#[derive(Clone, Copy, Debug)]
pub struct RasEntity {
    pub(crate) link: Option<RunLink>,
    pub(crate) weight: u32,
    pub(crate) time_slice: u32,
    /// Write count used the last time the weight was computed
    pub(crate) old_wcounts: u64,
    pub(crate) class: TaskClass,
    pub(crate) exec_start: u64,
    pub(crate) sum_exec_runtime: u64,
    pub(crate) exec_max: u64,
}

impl RasEntity {
    pub const fn new() -> Self {
        Self {
            link: None,
            weight: RAS_MAX_WEIGHT,
            time_slice: 0,
            old_wcounts: 0,
            class: TaskClass::Foreground,
            exec_start: 0,
            sum_exec_runtime: 0,
            exec_max: 0,
        }
    }

    #[inline]
    pub fn is_queued(&self) -> bool {
        self.link.is_some()
    }

    /// CPU whose run queue holds this entity
    #[inline]
    pub fn queued_on(&self) -> Option<CpuId> {
        self.link.map(|link| link.cpu)
    }

    #[inline]
    pub fn weight(&self) -> u32 {
        self.weight
    }

    #[inline]
    pub fn time_slice(&self) -> u32 {
        self.time_slice
    }

    #[inline]
    pub fn old_wcounts(&self) -> u64 {
        self.old_wcounts
    }

    /// Classification from the last slice computation
    #[inline]
    pub fn class(&self) -> TaskClass {
        self.class
    }

    #[inline]
    pub fn exec_start(&self) -> u64 {
        self.exec_start
    }

    #[inline]
    pub fn sum_exec_runtime(&self) -> u64 {
        self.sum_exec_runtime
    }

    #[inline]
    pub fn exec_max(&self) -> u64 {
        self.exec_max
    }

    /// Charge `now - exec_start` to this entity and restart the interval.
    /// A clock that went backwards charges nothing.
    pub(crate) fn account_exec(&mut self, now: u64) -> u64 {
        let delta = now.saturating_sub(self.exec_start);
        self.exec_max = self.exec_max.max(delta);
        self.sum_exec_runtime = self.sum_exec_runtime.saturating_add(delta);
        self.exec_start = now;
        delta
    }
}

impl Default for RasEntity {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixed-capacity table of entities
pub struct RasEntityTable {
    slots: [Option<RasEntity>; MAX_RAS_TASKS],
    attached: usize,
}

impl RasEntityTable {
    pub const fn new() -> Self {
        Self {
            slots: [None; MAX_RAS_TASKS],
            attached: 0,
        }
    }

    /// Create the entity for a task entering the RAS class.
    pub fn attach(&mut self, task: TaskId) -> Result<(), RasError> {
        let slot = self.slots.get_mut(task.index()).ok_or(RasError::InvalidTask)?;
        if slot.is_some() {
            return Err(RasError::AlreadyAttached);
        }
        *slot = Some(RasEntity::new());
        self.attached += 1;
        Ok(())
    }

    /// Destroy a task's entity. Refused while it is still on a run queue.
    pub fn detach(&mut self, task: TaskId) -> Result<RasEntity, RasError> {
        let slot = self.slots.get_mut(task.index()).ok_or(RasError::InvalidTask)?;
        match slot.as_ref() {
            None => return Err(RasError::NoEntity),
            Some(entity) if entity.is_queued() => return Err(RasError::StillQueued),
            Some(_) => {}
        }

        let entity = slot.take().ok_or(RasError::NoEntity)?;
        self.attached -= 1;
        Ok(entity)
    }

    #[inline]
    pub fn get(&self, task: TaskId) -> Option<&RasEntity> {
        self.slots.get(task.index()).and_then(Option::as_ref)
    }

    #[inline]
    pub fn get_mut(&mut self, task: TaskId) -> Option<&mut RasEntity> {
        self.slots.get_mut(task.index()).and_then(Option::as_mut)
    }

    pub(crate) fn lookup(&self, task: TaskId) -> Result<&RasEntity, RasError> {
        match self.slots.get(task.index()) {
            None => Err(RasError::InvalidTask),
            Some(slot) => slot.as_ref().ok_or(RasError::NoEntity),
        }
    }

    pub(crate) fn lookup_mut(&mut self, task: TaskId) -> Result<&mut RasEntity, RasError> {
        match self.slots.get_mut(task.index()) {
            None => Err(RasError::InvalidTask),
            Some(slot) => slot.as_mut().ok_or(RasError::NoEntity),
        }
    }

    #[inline]
    pub fn contains(&self, task: TaskId) -> bool {
        self.get(task).is_some()
    }

    /// Number of attached entities
    #[inline]
    pub fn len(&self) -> usize {
        self.attached
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.attached == 0
    }
}

impl Default for RasEntityTable {
    fn default() -> Self {
        Self::new()
    }
}
