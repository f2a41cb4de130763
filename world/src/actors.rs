//! Actor roster primitives and the bounded step navigator.

use gridfire_core::{
    archetype::ArchetypeId, ActorId, Direction, Event, Facing, TileCoord, WorldPoint,
};

use crate::terrain::TerrainGrid;

/// One live actor in the roster.
///
/// Position is derived, not stored: an idle actor sits on its tile's origin
/// and a moving one is interpolated between the current and intended tile by
/// the remaining pace ticks.
#[derive(Debug)]
pub(crate) struct Actor {
    pub(crate) id: ActorId,
    pub(crate) archetype: ArchetypeId,
    pub(crate) tile: TileCoord,
    pub(crate) intended: Option<TileCoord>,
    pub(crate) ticks_remaining: u32,
    pub(crate) ticks_total: u32,
    pub(crate) facing: Facing,
    pub(crate) health: u16,
    pub(crate) doom: Option<u32>,
    pub(crate) retry: RetryStack,
    pub(crate) stuck: bool,
}

impl Actor {
    /// Interpolated world position between the current and intended tile.
    pub(crate) fn position(&self) -> WorldPoint {
        match self.intended {
            None => self.tile.origin(),
            Some(target) => {
                if self.ticks_total == 0 {
                    return target.origin();
                }
                let progress =
                    (self.ticks_total - self.ticks_remaining) as f32 / self.ticks_total as f32;
                let from = self.tile.origin();
                let to = target.origin();
                WorldPoint::new(
                    from.x() + (to.x() - from.x()) * progress,
                    from.y() + (to.y() - from.y()) * progress,
                )
            }
        }
    }
}

/// Runs the bounded fallback search for one step request.
///
/// The probe starts at the requested direction, or resumes clockwise past
/// the last rejection when the request repeats the stack's base. Rejections
/// survive committed steps and arrivals, so a detour keeps its bearing until
/// the base direction changes. Four accumulated rejections exhaust the
/// search; the stack is discarded so the next attempt starts fresh.
pub(crate) fn step_actor(
    terrain: &TerrainGrid,
    claims: &mut ClaimGrid,
    actor: &mut Actor,
    request: StepRequest,
    out_events: &mut Vec<Event>,
) {
    if actor.doom.is_some() || actor.intended.is_some() {
        return;
    }

    if !actor.retry.is_empty() && actor.retry.base() != Some(request.direction) {
        actor.retry.clear();
    }
    let mut candidate = match actor.retry.top() {
        Some(top) => top.rotated_clockwise(),
        None => {
            actor.retry.begin(request.direction);
            request.direction
        }
    };

    loop {
        let target = actor.tile.stepped(candidate);
        let blocked = terrain.blocks_motion(target) || !claims.accepts(target, actor.id);
        if !blocked {
            actor.intended = Some(target);
            actor.ticks_total = request.pace;
            actor.ticks_remaining = request.pace;
            actor.facing = Facing::from_direction(candidate);
            actor.stuck = false;
            claims.claim(target, actor.id);
            out_events.push(Event::ActorStepCommitted {
                actor: actor.id,
                from: actor.tile,
                to: target,
            });
            return;
        }

        actor.retry.push(candidate);
        if actor.retry.len() >= RetryStack::CAPACITY {
            actor.retry.clear();
            actor.stuck = true;
            out_events.push(Event::ActorStepStuck {
                actor: actor.id,
                direction: request.direction,
            });
            return;
        }
        candidate = candidate.rotated_clockwise();
    }
}

/// Bounded record of directions rejected during one fallback search.
#[derive(Debug, Default)]
pub(crate) struct RetryStack {
    base: Option<Direction>,
    rejected: [Option<Direction>; Self::CAPACITY],
    len: usize,
}

impl RetryStack {
    const CAPACITY: usize = 4;

    fn clear(&mut self) {
        *self = Self::default();
    }

    fn begin(&mut self, base: Direction) {
        self.base = Some(base);
    }

    fn base(&self) -> Option<Direction> {
        self.base
    }

    fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn len(&self) -> usize {
        self.len
    }

    fn top(&self) -> Option<Direction> {
        if self.len == 0 {
            None
        } else {
            self.rejected[self.len - 1]
        }
    }

    fn push(&mut self, direction: Direction) {
        if self.len < Self::CAPACITY {
            self.rejected[self.len] = Some(direction);
            self.len += 1;
        }
    }
}

/// Latest queued step request per actor, drained in id order at tick time.
#[derive(Debug, Default)]
pub(crate) struct StepFrame {
    requests: Vec<StepRequest>,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct StepRequest {
    pub(crate) actor: ActorId,
    pub(crate) direction: Direction,
    pub(crate) pace: u32,
}

impl StepFrame {
    pub(crate) fn queue(&mut self, request: StepRequest) {
        if let Some(existing) = self
            .requests
            .iter_mut()
            .find(|existing| existing.actor == request.actor)
        {
            *existing = request;
        } else {
            self.requests.push(request);
        }
    }

    pub(crate) fn drain_sorted(&mut self) -> Vec<StepRequest> {
        self.requests.sort_by_key(|request| request.actor);
        std::mem::take(&mut self.requests)
    }

    pub(crate) fn clear(&mut self) {
        self.requests.clear();
    }
}

/// Dense tile claim table; a moving actor claims both its current tile and
/// the tile it heads toward.
#[derive(Debug)]
pub(crate) struct ClaimGrid {
    columns: u32,
    rows: u32,
    cells: Vec<Option<ActorId>>,
}

impl ClaimGrid {
    pub(crate) fn new(columns: u32, rows: u32) -> Self {
        Self {
            columns,
            rows,
            cells: vec![None; columns as usize * rows as usize],
        }
    }

    pub(crate) fn reset(&mut self, columns: u32, rows: u32) {
        *self = Self::new(columns, rows);
    }

    fn index(&self, tile: TileCoord) -> Option<usize> {
        let column = u32::try_from(tile.column()).ok()?;
        let row = u32::try_from(tile.row()).ok()?;
        if column < self.columns && row < self.rows {
            Some(row as usize * self.columns as usize + column as usize)
        } else {
            None
        }
    }

    pub(crate) fn claimant(&self, tile: TileCoord) -> Option<ActorId> {
        self.index(tile)
            .and_then(|index| self.cells.get(index).copied().flatten())
    }

    /// Whether the actor may enter the tile: in bounds and either unclaimed
    /// or claimed by the actor itself.
    fn accepts(&self, tile: TileCoord, actor: ActorId) -> bool {
        match self.index(tile) {
            Some(index) => self.cells[index].map_or(true, |claimant| claimant == actor),
            None => false,
        }
    }

    pub(crate) fn claim(&mut self, tile: TileCoord, actor: ActorId) {
        if let Some(index) = self.index(tile) {
            self.cells[index] = Some(actor);
        }
    }

    /// Clears the claim only when it is still held by the given actor.
    pub(crate) fn release(&mut self, tile: TileCoord, actor: ActorId) {
        if let Some(index) = self.index(tile) {
            if self.cells[index] == Some(actor) {
                self.cells[index] = None;
            }
        }
    }

    pub(crate) fn cells(&self) -> &[Option<ActorId>] {
        &self.cells
    }
}
