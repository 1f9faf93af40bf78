//! Score, lives and the game-over tally.

use glam::Vec2;
use stack_engine::EntityId;

use crate::registry::Registry;

/// Something the orchestrator must surface to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringEvent {
    /// Score went up to the given value.
    Increased(u32),
    /// A scored box left the screen.
    Decreased(u32),
    LifeLost { remaining: u32 },
    OutOfLives,
}

/// Outcome of a finished round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameOverReport {
    pub score: u32,
    /// Beat the locally persisted best.
    pub record: bool,
    /// Good enough for the global leaderboard, or the cutoff is unknown.
    pub notable: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scoring {
    score: u32,
    lives: u32,
    max_lives: u32,
    ended: bool,
}

impl Scoring {
    pub fn new(max_lives: u32) -> Self {
        Self {
            score: 0,
            lives: max_lives,
            max_lives,
            ended: false,
        }
    }

    pub fn reset(&mut self, max_lives: u32) {
        *self = Self::new(max_lives);
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn max_lives(&self) -> u32 {
        self.max_lives
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Landing rule, applied to one ordered half of a collision pair.
    ///
    /// `body` scores when it is a dropped, unscored box touching the platform
    /// or any other box. Callers pass both orders of every pair; a box scores
    /// at most once however many contacts it reports.
    pub fn on_collision(
        &mut self,
        registry: &mut Registry,
        body: EntityId,
        other: EntityId,
    ) -> Option<ScoringEvent> {
        if self.ended || body == other {
            return None;
        }
        let lands_on = registry.is_platform(other) || registry.is_box(other);
        if !lands_on {
            return None;
        }
        let scored = registry.dropped_box_mut(body)?;
        if scored.has_scored || scored.lost_life {
            return None;
        }
        scored.has_scored = true;
        log::debug!("box {:?} landed on {:?}", body, other);

        let recount = registry.scored_count();
        if recount > self.score {
            self.score = recount;
            return Some(ScoringEvent::Increased(self.score));
        }
        None
    }

    /// Mark boxes whose center is below `offscreen_y` as lost, at most once
    /// each. A lost box that had scored gives its point back. Every lost box
    /// costs a life.
    pub fn scan_offscreen(
        &mut self,
        registry: &mut Registry,
        position_of: impl Fn(EntityId) -> Option<Vec2>,
        offscreen_y: f32,
    ) -> Vec<ScoringEvent> {
        let mut events = Vec::new();
        if self.ended {
            return events;
        }
        for i in 0..registry.dropped().len() {
            let b = &registry.dropped()[i];
            if b.lost_life {
                continue;
            }
            let Some(pos) = position_of(b.id) else { continue };
            if pos.y <= offscreen_y {
                continue;
            }

            let b = &mut registry.dropped_mut()[i];
            b.lost_life = true;
            log::debug!("box {:?} fell off-screen (scored: {})", b.id, b.has_scored);
            if b.has_scored {
                b.has_scored = false;
                self.score = self.score.saturating_sub(1);
                events.push(ScoringEvent::Decreased(self.score));
            }

            events.push(self.lose_life());
            if self.lives == 0 {
                events.push(ScoringEvent::OutOfLives);
                break;
            }
        }
        events
    }

    /// Consume one life.
    pub fn lose_life(&mut self) -> ScoringEvent {
        self.lives = self.lives.saturating_sub(1);
        ScoringEvent::LifeLost {
            remaining: self.lives,
        }
    }

    /// Close the round. Returns `None` if it was already closed.
    ///
    /// The final score only counts scored boxes still above the bottom edge
    /// (`viewport_height`).
    pub fn finalize(
        &mut self,
        registry: &Registry,
        position_of: impl Fn(EntityId) -> Option<Vec2>,
        viewport_height: f32,
        persisted_best: u32,
        min_to_beat: u32,
    ) -> Option<GameOverReport> {
        if self.ended {
            return None;
        }
        self.ended = true;

        let score = registry
            .dropped()
            .iter()
            .filter(|b| b.has_scored)
            .filter(|b| position_of(b.id).is_some_and(|p| p.y < viewport_height))
            .count() as u32;
        self.score = score;

        let record = score > persisted_best;
        let notable = score > min_to_beat;
        Some(GameOverReport {
            score,
            record,
            notable,
        })
    }
}
